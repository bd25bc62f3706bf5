//! Gauss-Legendre quadrature over boundary lines.

use super::GaussPoint;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::types::{Point2, PointCloud};

/// Largest supported number of Gauss-Legendre points.
pub const MAX_POINTS: usize = 10;

/// Non-negative abscissas and their weights, per rule size.
const HALF_RULES: [&[(f64, f64)]; MAX_POINTS] = [
    &[(0.0, 2.0)],
    &[(0.577_350_269_189_625_7, 1.0)],
    &[
        (0.0, 0.888_888_888_888_888_8),
        (0.774_596_669_241_483_4, 0.555_555_555_555_555_6),
    ],
    &[
        (0.339_981_043_584_856_3, 0.652_145_154_862_546_1),
        (0.861_136_311_594_052_6, 0.347_854_845_137_453_8),
    ],
    &[
        (0.0, 0.568_888_888_888_888_9),
        (0.538_469_310_105_683_1, 0.478_628_670_499_366_5),
        (0.906_179_845_938_664_0, 0.236_926_885_056_189_1),
    ],
    &[
        (0.238_619_186_083_196_9, 0.467_913_934_572_691_0),
        (0.661_209_386_466_264_5, 0.360_761_573_048_138_6),
        (0.932_469_514_203_152_1, 0.171_324_492_379_170_4),
    ],
    &[
        (0.0, 0.417_959_183_673_469_4),
        (0.405_845_151_377_397_2, 0.381_830_050_505_118_9),
        (0.741_531_185_599_394_5, 0.279_705_391_489_276_6),
        (0.949_107_912_342_758_5, 0.129_484_966_168_869_7),
    ],
    &[
        (0.183_434_642_495_649_8, 0.362_683_783_378_362_0),
        (0.525_532_409_916_329_0, 0.313_706_645_877_887_3),
        (0.796_666_477_413_626_7, 0.222_381_034_453_374_5),
        (0.960_289_856_497_536_3, 0.101_228_536_290_376_3),
    ],
    &[
        (0.0, 0.330_239_355_001_259_8),
        (0.324_253_423_403_808_9, 0.312_347_077_040_002_9),
        (0.613_371_432_700_590_4, 0.260_610_696_402_935_4),
        (0.836_031_107_326_635_8, 0.180_648_160_694_857_4),
        (0.968_160_239_507_626_1, 0.081_274_388_361_574_4),
    ],
    &[
        (0.148_874_338_981_631_2, 0.295_524_224_714_752_9),
        (0.433_395_394_129_247_2, 0.269_266_719_309_996_3),
        (0.679_409_568_299_024_4, 0.219_086_362_515_982_0),
        (0.865_063_366_688_984_5, 0.149_451_349_150_580_6),
        (0.973_906_528_517_171_7, 0.066_671_344_308_688_1),
    ],
];

/// Gauss-Legendre points on [-1, 1], ordered by ascending abscissa.
///
/// # Errors
///
/// Returns [`Error::InvalidParameters`] unless `1 <= n <= 10`.
pub fn gauss_legendre(n: usize) -> Result<Vec<GaussPoint>> {
    if !(1..=MAX_POINTS).contains(&n) {
        return Err(Error::InvalidParameters(format!(
            "Gauss-Legendre rule must have 1..={} points, got {}",
            MAX_POINTS, n
        )));
    }
    let half = HALF_RULES[n - 1];

    let negative = half
        .iter()
        .rev()
        .filter(|(x, _)| *x > 0.0)
        .map(|&(x, w)| GaussPoint::new([-x, 0.0, 0.0], w));
    let positive = half.iter().map(|&(x, w)| GaussPoint::new([x, 0.0, 0.0], w));

    Ok(negative.chain(positive).collect())
}

/// One boundary line used as an integration cell.
#[derive(Debug, Clone, PartialEq)]
pub struct LineCell {
    /// Index of the line in the mesh.
    pub index: usize,
    /// Half the segment length (the 1D Jacobian).
    pub half_length: f64,
    /// Indices of the cell's quadrature points, in rule order.
    pub points: Vec<usize>,
}

impl LineCell {
    /// Jacobian scale of the cell.
    pub fn scale(&self) -> f64 {
        self.half_length
    }
}

/// Surface quadrature points of a mesh.
#[derive(Debug, Clone)]
pub struct LineQuadrature {
    /// Quadrature points, cell-major.
    pub points: PointCloud,
    /// One record per boundary line, in mesh order.
    pub cells: Vec<LineCell>,
    /// Rule weights (independent of the cell).
    pub weights: Vec<f64>,
}

impl LineQuadrature {
    /// Generate `n` Gauss-Legendre points on every boundary line of the mesh.
    pub fn generate(mesh: &Mesh, n: usize) -> Result<Self> {
        let gauss = gauss_legendre(n)?;
        let mut points = PointCloud::with_capacity(mesh.n_lines() * n);
        let mut cells = Vec::with_capacity(mesh.n_lines());

        for index in 0..mesh.n_lines() {
            let [p1, p2] = mesh.line_coords(index).ok_or_else(|| {
                Error::IndexConsistency(format!("line {} references a missing node", index))
            })?;
            let mid = (p1 + p2) / 2.0;
            let dir = p2 - p1;

            let cell_points = gauss
                .iter()
                .map(|gp| points.push(mid + dir * (gp.xi() / 2.0)))
                .collect();

            cells.push(LineCell {
                index,
                half_length: 0.5 * dir.norm(),
                points: cell_points,
            });
        }

        Ok(Self {
            points,
            cells,
            weights: gauss.iter().map(|gp| gp.weight).collect(),
        })
    }

    /// Integrate a scalar function along the boundary.
    pub fn integrate(&self, f: impl Fn(&Point2) -> f64) -> f64 {
        self.cells
            .iter()
            .map(|cell| {
                cell.points
                    .iter()
                    .zip(&self.weights)
                    .map(|(&p, &w)| w * f(&self.points[p]))
                    .sum::<f64>()
                    * cell.scale()
            })
            .sum()
    }
}
