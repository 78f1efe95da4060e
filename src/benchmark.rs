use std::fs::File;
use std::io::prelude::*;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::mapping::{IndexedDag, SpannerEnumerator};
use crate::{compile, Result};

#[derive(Serialize, Deserialize, Clone)]
pub struct BenchmarkCase {
    name: String,
    comment: String,
    filename: String,
    regex: String,
}

#[derive(Serialize, Deserialize)]
pub struct BenchmarkResult {
    benchmark: BenchmarkCase,
    num_results: usize,
    num_matrices: usize,
    width_avg: f64,
    width_max: usize,
    compile_regex: f64,
    preprocess: f64,
    enumerate: f64,
    delay_min: f64,
    delay_max: f64,
    delay_avg: f64,
    delay_stddev: f64,
    delay_hist: Vec<u32>,
}

impl BenchmarkCase {
    pub fn read_from_file(
        filename: &str,
    ) -> std::result::Result<Vec<BenchmarkCase>, Box<dyn std::error::Error>> {
        let mut input = String::new();
        File::open(filename)?.read_to_string(&mut input)?;
        let benchmarks: Vec<BenchmarkCase> = serde_json::from_str(&input)?;
        Ok(benchmarks)
    }

    pub fn new(name: String, comment: String, filename: String, regex: String) -> BenchmarkCase {
        BenchmarkCase {
            name,
            comment,
            filename,
            regex,
        }
    }

    pub fn run(&self) -> Result<BenchmarkResult> {
        let mut input = String::new();
        File::open(&self.filename)?.read_to_string(&mut input)?;

        let timer = Instant::now();
        let va = compile(&self.regex)?;
        let compile_regex = timer.elapsed();

        let timer = Instant::now();
        let mut indexed_dag = IndexedDag::new(&va, &input);
        indexed_dag.preprocess();
        let preprocess = timer.elapsed();

        let (widths, num_matrices) = indexed_dag.debug_summary().unwrap_or_default();
        let width_max = widths.iter().cloned().max().unwrap_or(0);
        let width_avg = if widths.is_empty() {
            0.0
        } else {
            widths.iter().sum::<usize>() as f64 / widths.len() as f64
        };

        let timer = Instant::now();
        let num_results = indexed_dag.iter().count();
        let enumerate = timer.elapsed();

        // Re-preprocess and re-enumerate from scratch for each of k repeats
        // (preprocessing then consumes the `IndexedDag`, same as any other
        // caller) and keep the minimum delay observed per match position, to
        // get rid of outliers from unrelated system noise.
        const K: usize = 10;
        let mut delays = Vec::with_capacity(K);
        for _ in 0..K {
            let mut indexed_dag = IndexedDag::new(&va, &input);
            indexed_dag.preprocess();

            let start_time = Instant::now();
            let mut times = Vec::with_capacity(num_results);
            for _ in indexed_dag.iter() {
                times.push(start_time.elapsed().subsec_nanos());
            }

            let mut last = 0;
            let delay: Vec<u32> = times
                .iter()
                .map(|&d| {
                    let elapsed = ((d + 1_000_000_000) - last) % 1_000_000_000;
                    last = d;
                    elapsed
                })
                .skip(1)
                .collect();

            delays.push(delay);
        }

        let mean_delays: Vec<u32> = if num_results > 1 {
            (0..num_results - 1)
                .map(|i| delays.iter().map(|d| d[i]).min().unwrap())
                .collect()
        } else {
            Vec::new()
        };

        let (delay_min, delay_max, delay_avg, delay_stddev, delay_hist) = if mean_delays.is_empty()
        {
            (0.0, 0.0, 0.0, 0.0, Vec::new())
        } else {
            let mean = stats::mean(mean_delays.iter().cloned());
            let stddev = stats::stddev(mean_delays.iter().cloned());
            let max = *mean_delays.iter().max().unwrap();
            let min = *mean_delays.iter().min().unwrap();
            let mut hist = vec![0; max as usize / 1000 + 1];
            for &d in &mean_delays {
                hist[d as usize / 1000] += 1;
            }
            (
                min as f64 / 1_000_000_000.0,
                max as f64 / 1_000_000_000.0,
                mean / 1_000_000_000.0,
                stddev / 1_000_000_000.0,
                hist,
            )
        };

        Ok(BenchmarkResult {
            benchmark: self.clone(),
            num_results,
            num_matrices,
            width_avg,
            width_max,
            compile_regex: compile_regex.as_secs_f64(),
            preprocess: preprocess.as_secs_f64(),
            enumerate: enumerate.as_secs_f64(),
            delay_min,
            delay_max,
            delay_avg,
            delay_stddev,
            delay_hist,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_reports_every_match_and_a_nonnegative_delay_histogram() {
        let mut path = std::env::temp_dir();
        path.push("enum_spanner_rs_benchmark_test_input.txt");
        std::fs::write(&path, "aaa").unwrap();

        let case = BenchmarkCase::new(
            "aaa".to_string(),
            "sanity check".to_string(),
            path.to_str().unwrap().to_string(),
            "a".to_string(),
        );

        let result = case.run().unwrap();
        assert_eq!(result.num_results, 3);
        assert!(result.delay_hist.iter().sum::<u32>() as usize <= result.num_results);

        std::fs::remove_file(&path).unwrap();
    }
}
