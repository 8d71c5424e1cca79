use super::tables::{DEMO_SRID, GEOMETRY_COLUMN, LINES_TABLE};
use crate::error::Result;
use crate::helper::SqliteHelper;
use geo_types::LineString;
use rand::Rng;
use std::io::Write;
use tracing::warn;

const MIN_VERTICES: usize = 2;
const MAX_VERTICES: usize = 10;
// Largest step between consecutive vertices, in degrees.
const MAX_STEP: f64 = 0.05;

/// Axis-aligned bounding box the random polylines stay within.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// South-east Queensland and New South Wales, in WGS 84 degrees.
pub const DEMO_EXTENT: Extent = Extent {
    min_x: 150.0,
    min_y: -35.0,
    max_x: 154.0,
    max_y: -26.0,
};

/// A random walk of 2 to 10 vertices starting anywhere in `extent`.
///
/// Every vertex is clamped to the extent.
pub fn random_polyline<R: Rng + ?Sized>(rng: &mut R, extent: &Extent) -> LineString<f64> {
    let vertex_count = rng.gen_range(MIN_VERTICES..=MAX_VERTICES);
    let mut x = rng.gen_range(extent.min_x..=extent.max_x);
    let mut y = rng.gen_range(extent.min_y..=extent.max_y);

    let mut coords = Vec::with_capacity(vertex_count);
    coords.push((x, y));
    for _ in 1..vertex_count {
        x = (x + rng.gen_range(-MAX_STEP..=MAX_STEP)).clamp(extent.min_x, extent.max_x);
        y = (y + rng.gen_range(-MAX_STEP..=MAX_STEP)).clamp(extent.min_y, extent.max_y);
        coords.push((x, y));
    }
    LineString::from(coords)
}

/// Insert `count` random polylines into the demo line table.
///
/// Each batch of `batch_size` rows is its own transaction; a failing batch is
/// rolled back and earlier batches stay committed. Progress is written to
/// `progress` after every batch.
pub fn generate_polylines<R, W>(
    helper: &SqliteHelper,
    rng: &mut R,
    count: usize,
    batch_size: usize,
    progress: &mut W,
) -> Result<usize>
where
    R: Rng + ?Sized,
    W: Write + ?Sized,
{
    let batch_size = batch_size.max(1);
    let mut inserted = 0;
    while inserted < count {
        let batch = batch_size.min(count - inserted);
        helper.begin_transaction()?;
        if let Err(err) = insert_batch(helper, rng, inserted, batch) {
            if let Err(rollback_err) = helper.rollback() {
                warn!(err = %rollback_err, "failed to roll back polyline batch");
            }
            return Err(err);
        }
        helper.commit()?;

        inserted += batch;
        writeln!(progress, "  {inserted}/{count} polylines inserted")?;
    }
    Ok(inserted)
}

fn insert_batch<R: Rng + ?Sized>(
    helper: &SqliteHelper,
    rng: &mut R,
    offset: usize,
    batch: usize,
) -> Result<()> {
    for i in offset..offset + batch {
        let line = random_polyline(rng, &DEMO_EXTENT);
        let name = format!("polyline {}", i + 1);
        helper.insert_geometry(
            LINES_TABLE,
            GEOMETRY_COLUMN,
            &line,
            DEMO_SRID,
            [("name", name)],
        )?;
    }
    Ok(())
}
