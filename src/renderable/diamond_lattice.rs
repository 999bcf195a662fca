//! A diamond-cubic crystal drawn entirely with impostors.
//!
//! Carbon atoms are instanced sphere impostors and the covalent bonds are
//! instanced cylinder impostors, so a lattice of tens of thousands of atoms
//! still only uploads two tiny proxy meshes plus one instance record per atom
//! and bond. Cut planes and coloring are applied per-pixel in the fragment
//! shaders; lattice size changes regenerate the instance buffers.

use std::collections::HashSet;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glamx::{Mat4, Vec3};

use crate::context::{Context, UniformLocation};
use crate::error::Error;
use crate::procedural::{unit_cylinder_triangles, unit_sphere_triangles};
use crate::renderable::cylinder_impostor::CYLINDER_IMPOSTOR_SCALE;
use crate::renderable::impostor::{proxy_vertices, FrameMatrices, ImpostorUniforms, ProxyVertex};
use crate::renderable::sphere_impostor::SPHERE_IMPOSTOR_SCALE;
use crate::renderable::Renderable;
use crate::resource::{
    GpuMesh, ProgramSource, ShaderProgram, VertexAttribute, VertexLayout,
};
use crate::world::World;

/// Highest selectable cut mode (0 = no cut, 1–3 = crystallographic planes).
pub const MAX_CUT_MODE: u32 = 3;

/// Upper bound on the lattice grid; beyond this the instance counts stop being
/// useful for an interactive viewer.
pub const MAX_UNIT_CELLS_PER_DIMENSION: u32 = 24;

/// Atom radius, in unit-cell lengths.
const ATOM_RADIUS: f32 = 0.12;

/// Bond radius, in unit-cell lengths.
const BOND_RADIUS: f32 = 0.05;

/// Radial subdivision of the bond proxy prisms.
const BOND_PROXY_SUBDIVISIONS: u32 = 6;

/// The eight atom sites of the diamond-cubic unit cell, in quarter-cell
/// coordinates. The first four form one fcc sublattice, the last four the
/// other, displaced by (1,1,1)/4.
const UNIT_CELL_SITES: [[i32; 3]; 8] = [
    [0, 0, 0],
    [0, 2, 2],
    [2, 0, 2],
    [2, 2, 0],
    [1, 1, 1],
    [1, 3, 3],
    [3, 1, 3],
    [3, 3, 1],
];

/// Bond directions from a first-sublattice atom to its four neighbors, in
/// quarter-cell coordinates.
const BOND_DIRECTIONS: [[i32; 3]; 4] = [[1, 1, 1], [1, -1, -1], [-1, 1, -1], [-1, -1, 1]];

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct AtomInstance {
    center: [f32; 3],
    radius: f32,
    sublattice: f32,
}

impl AtomInstance {
    const LAYOUT: VertexLayout = VertexLayout {
        attributes: &[
            VertexAttribute {
                name: "a_center",
                components: 3,
            },
            VertexAttribute {
                name: "a_radius",
                components: 1,
            },
            VertexAttribute {
                name: "a_sublattice",
                components: 1,
            },
        ],
    };
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct BondInstance {
    end_a: [f32; 3],
    end_b: [f32; 3],
    radius: f32,
}

impl BondInstance {
    const LAYOUT: VertexLayout = VertexLayout {
        attributes: &[
            VertexAttribute {
                name: "a_end_a",
                components: 3,
            },
            VertexAttribute {
                name: "a_end_b",
                components: 3,
            },
            VertexAttribute {
                name: "a_radius",
                components: 1,
            },
        ],
    };
}

/// One impostor pass of the crystal: a proxy mesh with instance records and
/// the program drawing it.
struct LatticePass {
    program: ShaderProgram,
    uniforms: ImpostorUniforms,
    cut_mode_location: UniformLocation,
    color_mode_location: UniformLocation,
    mesh: GpuMesh,
}

impl LatticePass {
    fn close(&mut self) {
        self.program.close();
        self.mesh.close();
    }
}

/// A diamond crystal lattice drawn as instanced sphere and cylinder impostors.
pub struct DiamondLatticeImpostor {
    ctxt: Context,
    world: Rc<World>,
    atoms: LatticePass,
    bonds: LatticePass,
    cut_mode: u32,
    color_mode: u32,
    unit_cells_per_dimension: u32,
    crystal_side_length: f32,
    rebuild_needed: bool,
}

impl DiamondLatticeImpostor {
    /// Builds the crystal with its default size (6 unit cells per dimension,
    /// side length 4).
    ///
    /// Construction is all-or-nothing: a failure releases every GPU resource
    /// created so far before it propagates.
    pub fn new(world: Rc<World>) -> Result<DiamondLatticeImpostor, Error> {
        let ctxt = Context::get();

        let unit_cells_per_dimension = 6;
        let crystal_side_length = 4.0;
        let (atom_instances, bond_instances) =
            lattice_instances(unit_cells_per_dimension, crystal_side_length);

        log::debug!(
            "Diamond lattice: {} atoms, {} bonds.",
            atom_instances.len(),
            bond_instances.len()
        );

        let atom_program = ShaderProgram::new(
            &ctxt,
            &ProgramSource {
                label: "diamond_atoms",
                vertex: include_str!("diamond_atoms.vert"),
                geometry: None,
                fragment: include_str!("diamond_atoms.frag"),
            },
        )?;
        let atom_uniforms = ImpostorUniforms::resolve(&atom_program)?;
        let atom_cut_mode = atom_program.uniform_location("cut_mode")?;
        let atom_color_mode = atom_program.uniform_location("color_mode")?;

        let sphere_proxy = proxy_vertices(
            &unit_sphere_triangles(0)?,
            Vec3::splat(SPHERE_IMPOSTOR_SCALE),
        );
        let atom_mesh = GpuMesh::with_instances(
            &ctxt,
            &sphere_proxy,
            &ProxyVertex::LAYOUT,
            &atom_instances,
            &AtomInstance::LAYOUT,
        )?;

        let atoms = LatticePass {
            program: atom_program,
            uniforms: atom_uniforms,
            cut_mode_location: atom_cut_mode,
            color_mode_location: atom_color_mode,
            mesh: atom_mesh,
        };

        let bond_program = ShaderProgram::new(
            &ctxt,
            &ProgramSource {
                label: "diamond_bonds",
                vertex: include_str!("diamond_bonds.vert"),
                geometry: None,
                fragment: include_str!("diamond_bonds.frag"),
            },
        )?;
        let bond_uniforms = ImpostorUniforms::resolve(&bond_program)?;
        let bond_cut_mode = bond_program.uniform_location("cut_mode")?;
        let bond_color_mode = bond_program.uniform_location("color_mode")?;

        let cylinder_proxy = proxy_vertices(
            &unit_cylinder_triangles(BOND_PROXY_SUBDIVISIONS, true)?,
            CYLINDER_IMPOSTOR_SCALE,
        );
        let bond_mesh = GpuMesh::with_instances(
            &ctxt,
            &cylinder_proxy,
            &ProxyVertex::LAYOUT,
            &bond_instances,
            &BondInstance::LAYOUT,
        )?;

        let bonds = LatticePass {
            program: bond_program,
            uniforms: bond_uniforms,
            cut_mode_location: bond_cut_mode,
            color_mode_location: bond_color_mode,
            mesh: bond_mesh,
        };

        Ok(DiamondLatticeImpostor {
            ctxt,
            world,
            atoms,
            bonds,
            cut_mode: 0,
            color_mode: 0,
            unit_cells_per_dimension,
            crystal_side_length,
            rebuild_needed: false,
        })
    }

    /// The active cut mode.
    pub fn cut_mode(&self) -> u32 {
        self.cut_mode
    }

    /// Selects a cut plane: 0 disables cutting, 1–3 cut along the {100},
    /// {110}, and {111} planes. Takes effect on the next frame.
    pub fn set_cut_mode(&mut self, cut_mode: u32) -> Result<(), Error> {
        if cut_mode > MAX_CUT_MODE {
            return Err(Error::InvalidParameter(format!(
                "cut mode must be at most {}, got {}",
                MAX_CUT_MODE, cut_mode
            )));
        }

        self.cut_mode = cut_mode;
        Ok(())
    }

    /// The active color mode.
    pub fn color_mode(&self) -> u32 {
        self.color_mode
    }

    /// Selects atom coloring: 0 for plain carbon, 1 to tint the two fcc
    /// sublattices differently. Takes effect on the next frame.
    pub fn set_color_mode(&mut self, color_mode: u32) -> Result<(), Error> {
        if color_mode > 1 {
            return Err(Error::InvalidParameter(format!(
                "color mode must be 0 or 1, got {}",
                color_mode
            )));
        }

        self.color_mode = color_mode;
        Ok(())
    }

    /// The lattice grid size.
    pub fn unit_cells_per_dimension(&self) -> u32 {
        self.unit_cells_per_dimension
    }

    /// Resizes the lattice grid. The instance buffers are regenerated on the
    /// next frame.
    pub fn set_unit_cells_per_dimension(&mut self, unit_cells: u32) -> Result<(), Error> {
        if unit_cells == 0 || unit_cells > MAX_UNIT_CELLS_PER_DIMENSION {
            return Err(Error::InvalidParameter(format!(
                "unit cells per dimension must lie in 1..={}, got {}",
                MAX_UNIT_CELLS_PER_DIMENSION, unit_cells
            )));
        }

        if unit_cells != self.unit_cells_per_dimension {
            self.unit_cells_per_dimension = unit_cells;
            self.rebuild_needed = true;
        }
        Ok(())
    }

    /// The side length of the cube the crystal is trimmed to, in unit cells.
    pub fn crystal_side_length(&self) -> f32 {
        self.crystal_side_length
    }

    /// Trims the crystal to a centered cube of the given side length. The
    /// instance buffers are regenerated on the next frame.
    pub fn set_crystal_side_length(&mut self, side_length: f32) -> Result<(), Error> {
        if !(side_length >= 0.0 && side_length.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "crystal side length must be finite and non-negative, got {}",
                side_length
            )));
        }

        if side_length != self.crystal_side_length {
            self.crystal_side_length = side_length;
            self.rebuild_needed = true;
        }
        Ok(())
    }

    /// Replaces both instanced meshes after a lattice parameter change.
    ///
    /// Buffers stay upload-once: the old ones are released and fresh ones
    /// uploaded, nothing is mutated in place.
    fn rebuild_meshes(&mut self) -> Result<(), Error> {
        let (atom_instances, bond_instances) =
            lattice_instances(self.unit_cells_per_dimension, self.crystal_side_length);

        log::debug!(
            "Diamond lattice rebuilt: {} atoms, {} bonds.",
            atom_instances.len(),
            bond_instances.len()
        );

        let sphere_proxy = proxy_vertices(
            &unit_sphere_triangles(0)?,
            Vec3::splat(SPHERE_IMPOSTOR_SCALE),
        );
        let atom_mesh = GpuMesh::with_instances(
            &self.ctxt,
            &sphere_proxy,
            &ProxyVertex::LAYOUT,
            &atom_instances,
            &AtomInstance::LAYOUT,
        )?;

        let cylinder_proxy = proxy_vertices(
            &unit_cylinder_triangles(BOND_PROXY_SUBDIVISIONS, true)?,
            CYLINDER_IMPOSTOR_SCALE,
        );
        let bond_mesh = GpuMesh::with_instances(
            &self.ctxt,
            &cylinder_proxy,
            &ProxyVertex::LAYOUT,
            &bond_instances,
            &BondInstance::LAYOUT,
        )?;

        // Swap only once both uploads succeeded; the old meshes close here.
        self.atoms.mesh.close();
        self.atoms.mesh = atom_mesh;
        self.bonds.mesh.close();
        self.bonds.mesh = bond_mesh;
        self.rebuild_needed = false;

        Ok(())
    }

    fn render_pass(&self, pass: &LatticePass, matrices: &FrameMatrices) {
        pass.program.bind();
        pass.uniforms
            .upload(&pass.program, matrices, self.world.impostor_mode());
        pass.program
            .set_uniform_u32(pass.cut_mode_location, self.cut_mode);
        pass.program
            .set_uniform_u32(pass.color_mode_location, self.color_mode);

        pass.mesh.bind();
        self.ctxt.enable_backface_culling();
        self.ctxt.draw_triangles_instanced(
            0,
            pass.mesh.vertex_count() as i32,
            pass.mesh.instance_count() as i32,
        );
    }
}

impl Renderable for DiamondLatticeImpostor {
    fn render(&mut self, projection: &Mat4, view: &Mat4, model: &Mat4) -> Result<(), Error> {
        if self.rebuild_needed {
            self.rebuild_meshes()?;
        }

        let matrices = FrameMatrices::derive(projection, view, model)?;

        self.render_pass(&self.atoms, &matrices);
        self.render_pass(&self.bonds, &matrices);

        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.atoms.close();
        self.bonds.close();
        Ok(())
    }
}

/// Generates the instance records of the trimmed crystal.
///
/// Atom positions are expressed in unit-cell lengths, centered on the origin.
/// A bond is kept when both of its atoms are.
fn lattice_instances(
    unit_cells_per_dimension: u32,
    crystal_side_length: f32,
) -> (Vec<AtomInstance>, Vec<BondInstance>) {
    let n = unit_cells_per_dimension as i32;

    let mut sites = HashSet::new();
    for cell_x in 0..n {
        for cell_y in 0..n {
            for cell_z in 0..n {
                for site in &UNIT_CELL_SITES {
                    sites.insert([
                        4 * cell_x + site[0],
                        4 * cell_y + site[1],
                        4 * cell_z + site[2],
                    ]);
                }
            }
        }
    }

    // Quarter-cell grid coordinates run 0..=4n-1; center them on the origin.
    let center = (4.0 * n as f32 - 1.0) / 2.0;
    let half_side = crystal_side_length / 2.0;

    let world_position = |site: &[i32; 3]| -> Vec3 {
        Vec3::new(
            (site[0] as f32 - center) / 4.0,
            (site[1] as f32 - center) / 4.0,
            (site[2] as f32 - center) / 4.0,
        )
    };

    let inside = |position: Vec3| -> bool {
        position.x.abs() <= half_side
            && position.y.abs() <= half_side
            && position.z.abs() <= half_side
    };

    let mut atoms = Vec::new();
    let mut bonds = Vec::new();

    let mut ordered: Vec<[i32; 3]> = sites.iter().copied().collect();
    ordered.sort();

    for site in &ordered {
        let position = world_position(site);
        if !inside(position) {
            continue;
        }

        let on_first_sublattice = (site[0] + site[1] + site[2]) % 4 == 0;

        atoms.push(AtomInstance {
            center: position.to_array(),
            radius: ATOM_RADIUS,
            sublattice: if on_first_sublattice { 0.0 } else { 1.0 },
        });

        if !on_first_sublattice {
            continue;
        }

        for direction in &BOND_DIRECTIONS {
            let neighbor = [
                site[0] + direction[0],
                site[1] + direction[1],
                site[2] + direction[2],
            ];

            if !sites.contains(&neighbor) {
                continue;
            }

            let neighbor_position = world_position(&neighbor);
            if !inside(neighbor_position) {
                continue;
            }

            bonds.push(BondInstance {
                end_a: position.to_array(),
                end_b: neighbor_position.to_array(),
                radius: BOND_RADIUS,
            });
        }
    }

    (atoms, bonds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_has_eight_atoms_when_untrimmed() {
        let (atoms, bonds) = lattice_instances(1, 100.0);

        assert_eq!(atoms.len(), 8);
        // Within one isolated cell, exactly the four interior bonds from the
        // (1,1,1)/4-type sites' parents are present.
        assert!(!bonds.is_empty());
        for bond in &bonds {
            let a = Vec3::from(bond.end_a);
            let b = Vec3::from(bond.end_b);
            // Nearest-neighbor distance of the diamond lattice: sqrt(3)/4.
            assert!(((a - b).length() - 3.0f32.sqrt() / 4.0).abs() < 1.0e-5);
        }
    }

    #[test]
    fn every_bond_connects_opposite_sublattices() {
        let (atoms, bonds) = lattice_instances(2, 100.0);

        // Both sublattices are equally populated.
        let first = atoms.iter().filter(|a| a.sublattice == 0.0).count();
        assert_eq!(first * 2, atoms.len());

        for bond in &bonds {
            assert!(bond.radius > 0.0);
            let a = Vec3::from(bond.end_a);
            let b = Vec3::from(bond.end_b);
            assert!(((a - b).length() - 3.0f32.sqrt() / 4.0).abs() < 1.0e-5);
        }
    }

    #[test]
    fn trimming_shrinks_the_crystal() {
        let (all_atoms, all_bonds) = lattice_instances(4, 100.0);
        let (cut_atoms, cut_bonds) = lattice_instances(4, 1.0);

        assert!(cut_atoms.len() < all_atoms.len());
        assert!(cut_bonds.len() < all_bonds.len());
        assert!(!cut_atoms.is_empty());

        for atom in &cut_atoms {
            let position = Vec3::from(atom.center);
            assert!(position.x.abs() <= 0.5);
            assert!(position.y.abs() <= 0.5);
            assert!(position.z.abs() <= 0.5);
        }
    }

    #[test]
    fn zero_side_length_empties_the_crystal() {
        // The grid has no site exactly at the (half-integer) center, so a zero
        // side keeps nothing.
        let (atoms, bonds) = lattice_instances(2, 0.0);
        assert!(atoms.is_empty());
        assert!(bonds.is_empty());
    }

    use crate::test_support::CountingBackend;
    use crate::world::World;

    #[test]
    fn renders_atoms_and_bonds_as_two_instanced_draws() {
        let backend = CountingBackend::install();
        let world = Rc::new(World::new());

        let mut lattice = DiamondLatticeImpostor::new(world).unwrap();

        lattice
            .render(&Mat4::IDENTITY, &Mat4::IDENTITY, &Mat4::IDENTITY)
            .unwrap();
        assert_eq!(backend.draw_calls(), 2);

        lattice.close().unwrap();
        assert_eq!(backend.live_total(), 0);
        lattice.close().unwrap();
        assert_eq!(backend.live_total(), 0);
    }

    #[test]
    fn resizing_regenerates_the_instance_buffers_without_leaking() {
        let backend = CountingBackend::install();
        let world = Rc::new(World::new());

        let mut lattice = DiamondLatticeImpostor::new(world).unwrap();
        let live_after_construction = backend.live_total();

        lattice.set_unit_cells_per_dimension(2).unwrap();
        lattice
            .render(&Mat4::IDENTITY, &Mat4::IDENTITY, &Mat4::IDENTITY)
            .unwrap();

        // The old instanced meshes were released, the fresh ones replace them
        // one for one.
        assert_eq!(backend.live_total(), live_after_construction);

        lattice.close().unwrap();
        assert_eq!(backend.live_total(), 0);
    }

    #[test]
    fn missing_lattice_uniform_leaks_no_gpu_handles() {
        let backend = CountingBackend::install();
        *backend.missing_uniform.borrow_mut() = Some("cut_mode");
        let world = Rc::new(World::new());

        let result = DiamondLatticeImpostor::new(world);

        assert!(matches!(
            result,
            Err(Error::MissingUniform { name: "cut_mode" })
        ));
        assert_eq!(backend.live_total(), 0);
    }

    #[test]
    fn runtime_parameters_are_validated() {
        let backend = CountingBackend::install();
        let world = Rc::new(World::new());
        let mut lattice = DiamondLatticeImpostor::new(world).unwrap();

        assert!(lattice.set_cut_mode(MAX_CUT_MODE).is_ok());
        assert!(lattice.set_cut_mode(MAX_CUT_MODE + 1).is_err());
        assert!(lattice.set_color_mode(2).is_err());
        assert!(lattice.set_unit_cells_per_dimension(0).is_err());
        assert!(lattice
            .set_unit_cells_per_dimension(MAX_UNIT_CELLS_PER_DIMENSION + 1)
            .is_err());
        assert!(lattice.set_crystal_side_length(f32::NAN).is_err());
        assert!(lattice.set_crystal_side_length(-1.0).is_err());

        lattice.close().unwrap();
        assert_eq!(backend.live_total(), 0);
    }
}
