use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use oilgen_deposit::{DepositClass, DepositGenerator, PopulateReport};
use oilgen_testkit::{
    oil_blocks, CacheMetrics, GenerationMetrics, MetricsReportBuilder, MetricsSink,
    TestExecutionMetrics,
};
use oilgen_world::{ChunkPos, VoxelWorld};
use tracing::info;

use crate::config::AppConfig;

/// Upper bound on timing slots reserved before a population run.
const MAX_TIMING_RESERVE: usize = 1 << 16;

/// Inclusive rectangle of chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub min: ChunkPos,
    pub max: ChunkPos,
}

impl Region {
    /// Number of chunks covered, saturating at `u64::MAX`.
    pub fn chunk_count(&self) -> u64 {
        let w = (i64::from(self.max.x) - i64::from(self.min.x) + 1) as u64;
        let h = (i64::from(self.max.z) - i64::from(self.min.z) + 1) as u64;
        w.saturating_mul(h)
    }

    /// Chunks row by row, Z outer and X inner.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        (self.min.z..=self.max.z)
            .flat_map(move |z| (self.min.x..=self.max.x).map(move |x| ChunkPos::new(x, z)))
    }
}

impl FromStr for Region {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let values = parse_ints(s)?;
        let &[x0, z0, x1, z1] = values.as_slice() else {
            bail!("expected x0,z0,x1,z1, got '{s}'");
        };
        Ok(Self {
            min: ChunkPos::new(x0.min(x1), z0.min(z1)),
            max: ChunkPos::new(x0.max(x1), z0.max(z1)),
        })
    }
}

/// Chunk coordinate given as `x,z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkArg(pub ChunkPos);

impl FromStr for ChunkArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let values = parse_ints(s)?;
        let &[x, z] = values.as_slice() else {
            bail!("expected x,z, got '{s}'");
        };
        Ok(Self(ChunkPos::new(x, z)))
    }
}

fn parse_ints(s: &str) -> Result<Vec<i32>> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .with_context(|| format!("invalid chunk coordinate '{part}'"))
        })
        .collect()
}

fn class_symbol(class: DepositClass) -> char {
    match class {
        DepositClass::Large => 'L',
        DepositClass::Medium => 'M',
        DepositClass::Lake => 'o',
        DepositClass::None => '.',
    }
}

fn setup(app: &AppConfig) -> (VoxelWorld, DepositGenerator) {
    let world = app.world.build(app.seed);
    let generator =
        DepositGenerator::new(app.seed, app.deposits.clone()).with_cache(app.cache_capacity);
    (world, generator)
}

/// Print one symbol per chunk for the class of the deposit rooted there.
pub fn map(app: &AppConfig, region: Region, out: &mut impl Write) -> Result<()> {
    let (world, generator) = setup(app);
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();

    writeln!(
        out,
        "seed {} chunks x {}..={} z {}..={}  (L large, M medium, o lake)",
        app.seed, region.min.x, region.max.x, region.min.z, region.max.z
    )?;
    for z in region.min.z..=region.max.z {
        let row: String = (region.min.x..=region.max.x)
            .map(|x| {
                let class = generator.deposit_at(&world, ChunkPos::new(x, z)).class();
                *counts.entry(class.as_str()).or_default() += 1;
                class_symbol(class)
            })
            .collect();
        writeln!(out, "{z:>6} {row}")?;
    }
    for (class, count) in &counts {
        writeln!(out, "{class}: {count}")?;
    }
    Ok(())
}

/// Print the deposit rooted in `chunk` as pretty JSON.
pub fn inspect(app: &AppConfig, chunk: ChunkPos, out: &mut impl Write) -> Result<()> {
    let (world, generator) = setup(app);
    let deposit = generator.deposit_at(&world, chunk);
    serde_json::to_writer_pretty(&mut *out, deposit.as_ref())?;
    writeln!(out)?;
    Ok(())
}

/// Populate every chunk of `region` in order and summarise what was written.
pub fn populate(
    app: &AppConfig,
    region: Region,
    metrics_path: Option<&Path>,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let started = Instant::now();
    let (mut world, generator) = setup(app);
    let mut metrics = GenerationMetrics::default();
    let reserve = usize::try_from(region.chunk_count()).map_or(MAX_TIMING_RESERVE, |n| {
        n.min(MAX_TIMING_RESERVE)
    });
    let mut timings = Vec::with_capacity(reserve);

    for chunk in region.chunks() {
        let t = Instant::now();
        let report = generator.populate(&mut world, chunk);
        timings.push(t.elapsed().as_micros());

        let rooted = generator.deposit_at(&world, chunk).class();
        if rooted != DepositClass::None {
            *metrics
                .deposits_by_class
                .entry(rooted.as_str().to_string())
                .or_default() += 1;
        }
        record(&mut metrics, &report);
        if json {
            writeln!(out, "{}", serde_json::to_string(&report)?)?;
        }
    }
    metrics.record_timings(&timings);

    writeln!(
        out,
        "populated {} chunks: {} modified, {} voxels written, {} springs placed, {} oil blocks in world",
        metrics.chunks_populated,
        metrics.chunks_modified,
        metrics.voxels_written,
        metrics.springs_placed,
        oil_blocks(&world)
    )?;
    info!(
        chunks = metrics.chunks_populated,
        total_ms = metrics.total_time_ms,
        "population finished"
    );

    if let Some(path) = metrics_path {
        let mut builder = MetricsReportBuilder::new("populate", app.seed)
            .generation(metrics)
            .execution(TestExecutionMetrics {
                duration_seconds: started.elapsed().as_secs_f64(),
                validations_passed: None,
            });
        if let Some(cache) = generator.cache() {
            let stats = cache.stats();
            builder = builder.cache(CacheMetrics::from_counts(stats.hits, stats.misses));
        }
        MetricsSink::create(path)
            .and_then(|sink| sink.write(&builder.build()))
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
        info!("Metrics written to {}", path.display());
    }
    Ok(())
}

fn record(metrics: &mut GenerationMetrics, report: &PopulateReport) {
    metrics.chunks_populated += 1;
    if report.placed() {
        metrics.chunks_modified += 1;
    }
    metrics.voxels_written += report.voxels_written;
    metrics.springs_placed += report.springs_placed;
}

#[cfg(test)]
mod tests {
    use super::*;
    use oilgen_world::BiomeKey;

    fn app(biome: &str) -> AppConfig {
        let mut app = AppConfig {
            seed: 0x1234,
            ..AppConfig::default()
        };
        app.world.biomes = vec![BiomeKey::new(biome)];
        app
    }

    #[test]
    fn region_parses_and_orders_corners() {
        let region: Region = "3,-1,-2,4".parse().unwrap();
        assert_eq!(region.min, ChunkPos::new(-2, -1));
        assert_eq!(region.max, ChunkPos::new(3, 4));
        assert_eq!(region.chunk_count(), 36);
        let chunks: Vec<_> = region.chunks().take(2).collect();
        assert_eq!(chunks, vec![ChunkPos::new(-2, -1), ChunkPos::new(-1, -1)]);

        assert!("1,2,3".parse::<Region>().is_err());
        assert!("a,b,c,d".parse::<Region>().is_err());
    }

    #[test]
    fn chunk_count_spans_the_full_coordinate_range() {
        let row: Region = "-2147483648,0,2147483647,0".parse().unwrap();
        assert_eq!(row.chunk_count(), 1 << 32);

        let everything: Region = "-2147483648,-2147483648,2147483647,2147483647"
            .parse()
            .unwrap();
        assert_eq!(everything.chunk_count(), u64::MAX);
    }

    #[test]
    fn chunk_arg_parses_negative_coordinates() {
        let ChunkArg(chunk) = " -4, 7".parse().unwrap();
        assert_eq!(chunk, ChunkPos::new(-4, 7));
        assert!("4".parse::<ChunkArg>().is_err());
    }

    #[test]
    fn map_marks_lakes_in_the_desert() {
        let mut out = Vec::new();
        let region: Region = "-1,2,1,3".parse().unwrap();
        map(&app("desert"), region, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).take(2).collect();
        // Rows are z = 2 then z = 3, columns x = -1..=1.
        assert_eq!(rows[0].split_whitespace().collect::<Vec<_>>()[0], "2");
        let z2: Vec<char> = rows[0].split_whitespace().nth(1).unwrap().chars().collect();
        let z3: Vec<char> = rows[1].split_whitespace().nth(1).unwrap().chars().collect();
        assert_eq!(z2[0], 'o');
        assert_eq!(z3[2], 'o');
        assert!(text.contains("lake:"));
    }

    #[test]
    fn map_of_plains_is_empty() {
        let mut out = Vec::new();
        map(&app("plains"), "-1,-1,1,1".parse().unwrap(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("none: 9"));
        for row in text.lines().skip(1).take(3) {
            assert_eq!(row.split_whitespace().nth(1), Some("..."));
        }
    }

    #[test]
    fn inspect_prints_deposit_json() {
        let mut out = Vec::new();
        inspect(&app("desert"), ChunkPos::new(1, 3), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["placement"]["class"], "lake");
        assert_eq!(value["origin"]["x"], 1);
        assert_eq!(value["structures"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn far_chunks_inspect_and_populate_as_empty() {
        let mut out = Vec::new();
        inspect(&app("desert"), ChunkPos::new(200_000_000, 0), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["placement"]["class"], "none");

        let mut out = Vec::new();
        populate(
            &app("desert"),
            "2147483646,-2147483648,2147483647,-2147483648".parse().unwrap(),
            None,
            false,
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("populated 2 chunks: 0 modified"));
    }

    #[test]
    fn populate_writes_metrics_report() {
        let path = std::env::temp_dir().join(format!(
            "oilgen-populate-{}.json",
            std::process::id()
        ));
        let mut out = Vec::new();
        populate(
            &app("desert"),
            "0,0,1,0".parse().unwrap(),
            Some(&path),
            true,
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with('{')).count(), 2);
        assert!(text.contains("populated 2 chunks"));

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(report["test_name"], "populate");
        assert_eq!(report["seed"], 0x1234);
        assert_eq!(report["generation"]["chunks_populated"], 2);
        assert!(report["cache"]["misses"].as_u64().unwrap() > 0);
        std::fs::remove_file(&path).ok();
    }
}
