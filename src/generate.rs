//! The end-to-end pipeline: parameters in, lattice model out.

use tracing::info;

use crate::density::{self, DensitySolution};
use crate::domain::DomainShape;
use crate::errors::LatticeError;
use crate::field::{self, Equation, Topology, WaveNumbers};
use crate::float_types::Real;
use crate::grid::Grid;
use crate::isosurface::{self, TriangleMesh};
use crate::volume::Volume;

/// How the isovalue is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DensityMethod {
    /// Use the given isovalue directly, no solving.
    FixedIsovalue(Real),
    /// Solve for the isovalue whose solid fraction matches the target,
    /// which must lie strictly between 0 and 1.
    RelativeDensity(Real),
}

/// Everything needed to generate one lattice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeParams {
    /// Edge length of the cubic sampling domain.
    pub length: Real,
    /// Samples per axis.
    pub resolution: usize,
    /// Bounding primitive limiting the lattice.
    pub domain: DomainShape,
    /// Periodic implicit equation.
    pub equation: Equation,
    /// Solid/sheet rule applied to the equation.
    pub topology: Topology,
    /// Isovalue selection.
    pub method: DensityMethod,
    /// Unit-cell repetition counts `(Nx, Ny, Nz)`.
    pub cells: [Real; 3],
    /// Unit-cell edge lengths `(Lx, Ly, Lz)`.
    pub unit_cell: [Real; 3],
}

/// A generated lattice: the masked field, its mask, the extracted surface
/// and the sampling geometry they share.
#[derive(Clone, Debug)]
pub struct LatticeModel {
    /// Masked field: positive solid, negative pore, zero exterior.
    pub field: Volume<Real>,
    /// Domain mask the field was clipped with.
    pub mask: Volume<bool>,
    /// Zero-level surface of the field.
    pub mesh: TriangleMesh,
    /// Isovalue the field was generated at.
    pub isovalue: Real,
    /// Solid fraction of the field, whether solved for or incidental.
    pub achieved_density: Real,
    /// Voxel edge length.
    pub spacing: Real,
    /// Edge length of the sampling domain.
    pub length: Real,
    /// Samples per axis.
    pub resolution: usize,
}

impl LatticeModel {
    /// Solid fraction of the field over the domain mask.
    ///
    /// # Errors
    /// [`LatticeError::EmptyDomain`] when the mask holds no voxel; a model
    /// built by [`generate_lattice`] always has a nonempty mask.
    pub fn solid_fraction(&self) -> Result<Real, LatticeError> {
        density::solid_fraction(&self.field, &self.mask)
    }

    /// Voxel edge length, an alias for the grid spacing.
    pub const fn voxel_size(&self) -> Real {
        self.spacing
    }
}

/// Run the full pipeline: grid, mask, wave numbers, isovalue, field, mesh.
///
/// # Errors
/// Propagates [`LatticeError`] from parameter validation, empty domains and
/// failed density solves; additionally rejects relative-density targets
/// outside the open interval (0, 1).
pub fn generate_lattice(params: &LatticeParams) -> Result<LatticeModel, LatticeError> {
    if let DensityMethod::RelativeDensity(target) = params.method
        && !(target > 0.0 && target < 1.0)
    {
        return Err(LatticeError::InvalidParameter {
            name: "relative_density",
            value: target,
            constraint: "must lie strictly between 0 and 1",
        });
    }

    let grid = Grid::new(params.length, params.resolution)?;
    let mask = params.domain.mask(&grid)?;
    let k = WaveNumbers::new(
        params.cells[0],
        params.cells[1],
        params.cells[2],
        params.unit_cell[0],
        params.unit_cell[1],
        params.unit_cell[2],
    )?;

    let (isovalue, field, achieved_density) = match params.method {
        DensityMethod::RelativeDensity(target) => {
            let DensitySolution {
                isovalue,
                field,
                achieved_density,
            } = density::solve_isovalue(
                &grid,
                &mask,
                params.equation,
                params.topology,
                &k,
                target,
            )?;
            (isovalue, field, achieved_density)
        },
        DensityMethod::FixedIsovalue(isovalue) => {
            let raw = field::raw_field(&grid, params.equation, params.topology, &k, isovalue);
            let field = field::masked_field(&raw, &mask);
            let achieved = density::solid_fraction(&field, &mask)?;
            (isovalue, field, achieved)
        },
    };

    let mesh = isosurface::extract_isosurface(&field, grid.spacing);
    info!(
        equation = params.equation.name(),
        topology = params.topology.name(),
        domain = params.domain.name(),
        resolution = params.resolution,
        isovalue,
        achieved_density,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "lattice generated"
    );

    Ok(LatticeModel {
        field,
        mask,
        mesh,
        isovalue,
        achieved_density,
        spacing: grid.spacing,
        length: grid.length,
        resolution: grid.resolution,
    })
}
