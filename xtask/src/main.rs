use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use ndarray::{Array1, Array2, ArrayD};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sigtwin::backend::{precompile_kernels, Accelerated, DesignOps, Reference, SignalBackend};
use sigtwin::na::Complex;
use sigtwin::num_rs::ConvolveMode;
use sigtwin::oracle::{assert_equivalent, Tolerance};
use sigtwin::signal::convolve::{Boundary, ConvMethod};
use sigtwin::signal::filter::design::Sos;
use sigtwin::signal::windows::Window;
use sigtwin::signal::Real;
use sigtwin::Error as SignalError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_ITERS: usize = 50;
const DEFAULT_SEED: u64 = 0x5eed;

/// Driver settings, loaded from `--config` JSON and overridden by flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct ContractConfig {
    /// Timed iterations per accelerated call.
    iters: usize,
    /// Only run cases whose id contains this substring.
    filter: Option<String>,
    /// Output root; `target/contracts` when unset.
    out_dir: Option<PathBuf>,
    /// Seed for the random inputs.
    seed: u64,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            iters: DEFAULT_ITERS,
            filter: None,
            out_dir: None,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Dtype {
    F32,
    F64,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Resample { num: usize, kaiser: bool },
    ResamplePoly { up: usize, down: usize },
    UpFirDn { up: usize, down: usize },
    Convolve { mode: ConvolveMode, method: ConvMethod },
    Correlate { mode: ConvolveMode, method: ConvMethod },
    FftConvolve { mode: ConvolveMode },
    Convolve2d { mode: ConvolveMode, boundary: Boundary },
    Correlate2d { mode: ConvolveMode, boundary: Boundary },
    Sosfilt,
    Wiener,
    Wiener2d,
    Hilbert,
    Hilbert2,
}

impl Op {
    fn name(&self) -> &'static str {
        match self {
            Op::Resample { .. } => "resample",
            Op::ResamplePoly { .. } => "resample_poly",
            Op::UpFirDn { .. } => "upfirdn",
            Op::Convolve { .. } => "convolve",
            Op::Correlate { .. } => "correlate",
            Op::FftConvolve { .. } => "fftconvolve",
            Op::Convolve2d { .. } => "convolve2d",
            Op::Correlate2d { .. } => "correlate2d",
            Op::Sosfilt => "sosfilt",
            Op::Wiener | Op::Wiener2d => "wiener",
            Op::Hilbert => "hilbert",
            Op::Hilbert2 => "hilbert2",
        }
    }
}

/// One (operation, parameter set) entry of the contract table.
#[derive(Debug, Clone)]
struct Case {
    id: String,
    op: Op,
    dtype: Dtype,
    /// Require bit equality instead of the dtype tolerance.
    exact: bool,
}

impl Case {
    fn new(id: impl Into<String>, op: Op, dtype: Dtype) -> Self {
        Self {
            id: id.into(),
            op,
            dtype,
            exact: false,
        }
    }

    fn exact(mut self) -> Self {
        self.exact = true;
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ContractRow {
    case_id: String,
    op: String,
    dtype: Dtype,
    shape: Vec<usize>,
    passed: bool,
    violations: usize,
    max_abs: f64,
    mae: f64,
    rmse: f64,
    pearson_r: f64,
    accelerated_ns: f64,
    reference_ns: f64,
    speedup: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContractBundle {
    generated_epoch_seconds: u64,
    iters: usize,
    seed: u64,
    rayon_threads: usize,
    rows: Vec<ContractRow>,
}

#[derive(Parser)]
#[command(name = "xtask")]
#[command(author, version, about = "sigtwin backend contract driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every case through both backends and gate on the oracle
    Contracts {
        /// Timed iterations per accelerated call
        #[arg(long)]
        iters: Option<usize>,

        /// Only run cases whose id contains this substring
        #[arg(long)]
        filter: Option<String>,

        /// JSON file with driver settings; flags take precedence
        #[arg(long)]
        config: Option<PathBuf>,

        /// Log filter used when RUST_LOG is unset
        #[arg(long, default_value = "info")]
        log: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Contracts {
            iters,
            filter,
            config,
            log,
        } => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log)))
                .init();
            let config = contract_config(iters, filter, config.as_deref())?;
            run_contracts(&config)
        }
    }
}

/// Load `--config` (or the defaults) and apply flag overrides on top.
fn contract_config(
    iters: Option<usize>,
    filter: Option<String>,
    config_path: Option<&Path>,
) -> Result<ContractConfig> {
    let mut config = match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<ContractConfig>(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => ContractConfig::default(),
    };
    if let Some(iters) = iters {
        config.iters = iters;
    }
    if filter.is_some() {
        config.filter = filter;
    }
    if config.iters == 0 {
        bail!("--iters must be positive");
    }
    Ok(config)
}

fn contract_cases() -> Vec<Case> {
    use ConvolveMode::{Full, Same, Valid};
    use Dtype::{F32, F64};

    let mut cases = vec![
        Case::new("resample_1000_to_441_f64", Op::Resample { num: 441, kaiser: false }, F64),
        Case::new("resample_1000_to_2048_f64", Op::Resample { num: 2048, kaiser: false }, F64),
        Case::new("resample_kaiser_1000_to_750_f64", Op::Resample { num: 750, kaiser: true }, F64),
        Case::new("resample_1000_to_441_f32", Op::Resample { num: 441, kaiser: false }, F32),
        Case::new("resample_poly_3_2_f64", Op::ResamplePoly { up: 3, down: 2 }, F64),
        Case::new("resample_poly_1_4_f64", Op::ResamplePoly { up: 1, down: 4 }, F64),
        Case::new("resample_poly_160_147_f64", Op::ResamplePoly { up: 160, down: 147 }, F64),
        Case::new("resample_poly_3_2_f32", Op::ResamplePoly { up: 3, down: 2 }, F32),
        Case::new("upfirdn_identity_f64", Op::UpFirDn { up: 1, down: 1 }, F64),
        Case::new("upfirdn_3_2_chirp_f64", Op::UpFirDn { up: 3, down: 2 }, F64),
        Case::new("upfirdn_2_5_chirp_f32", Op::UpFirDn { up: 2, down: 5 }, F32),
        Case::new("sosfilt_butter4_f64", Op::Sosfilt, F64),
        Case::new("sosfilt_butter4_f32", Op::Sosfilt, F32),
        Case::new("wiener_1d_f64", Op::Wiener, F64),
        Case::new("wiener_2d_f64", Op::Wiener2d, F64),
        Case::new("hilbert_f64", Op::Hilbert, F64),
        Case::new("hilbert_f32", Op::Hilbert, F32),
        Case::new("hilbert2_f64", Op::Hilbert2, F64),
        Case::new(
            "correlate2d_box3_same_fill_f64",
            Op::Correlate2d { mode: Same, boundary: Boundary::Fill },
            F64,
        )
        .exact(),
    ];

    for mode in [Full, Valid, Same] {
        for method in [ConvMethod::Direct, ConvMethod::Fft, ConvMethod::Auto] {
            let tag = format!("{}_{}", mode.as_str(), method.as_str());
            cases.push(Case::new(
                format!("convolve_{tag}_f64"),
                Op::Convolve { mode, method },
                F64,
            ));
            cases.push(Case::new(
                format!("correlate_{tag}_f64"),
                Op::Correlate { mode, method },
                F64,
            ));
        }
        cases.push(Case::new(
            format!("fftconvolve_{}_f32", mode.as_str()),
            Op::FftConvolve { mode },
            F32,
        ));
        for boundary in [Boundary::Wrap, Boundary::Symm] {
            cases.push(Case::new(
                format!("convolve2d_{}_{}_f64", mode.as_str(), boundary.as_str()),
                Op::Convolve2d { mode, boundary },
                F64,
            ));
        }
    }
    cases
}

/// Inputs realized once per dtype and shared by both backends.
struct Inputs<F> {
    signal: Array1<F>,
    chirp: Array1<F>,
    kernel: Array1<F>,
    grid: Array2<F>,
    box3: Array2<F>,
    stencil: Array2<F>,
    bandpass: Vec<F>,
    sos: Vec<Sos<F>>,
}

impl<F: Real> Inputs<F> {
    fn realize(seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut uniform = move || F::cast(rng.random_range(-1.0..1.0));
        let signal = Array1::from_shape_fn(1000, |_| uniform());
        let kernel = Array1::from_shape_fn(37, |_| uniform());
        let grid = Array2::from_shape_fn((64, 64), |_| uniform());
        let stencil = Array2::from_shape_fn((5, 4), |_| uniform());
        let bandpass = Reference
            .firwin(101, &[F::cast(0.1), F::cast(0.3)], None, None, false, true, None)
            .map_err(|e| anyhow!("bandpass design failed: {e}"))?
            .to_vec();
        Ok(Self {
            signal,
            chirp: chirp(1 << 14),
            kernel,
            grid,
            box3: Array2::ones((3, 3)),
            stencil,
            bandpass,
            sos: butter_bandpass(),
        })
    }
}

/// `cos(-t^2 / 6)` sampled at `n` points evenly spaced on `[0, 10)`.
fn chirp<F: Real>(n: usize) -> Array1<F> {
    let dt = 10.0 / n as f64;
    Array1::from_shape_fn(n, |i| {
        let t = i as f64 * dt;
        F::cast((-t * t / 6.0).cos())
    })
}

fn butter_bandpass<F: Real>() -> Vec<Sos<F>> {
    // 4th order butterworth bandpass 10 to 50 at 1666Hz
    let flat: [f64; 24] = [
        2.677_576_738_259_783_5e-5,
        5.355_153_476_519_567e-5,
        2.677_576_738_259_783_5e-5,
        1.0,
        -1.7991202154617734,
        0.8162578614819005,
        1.0,
        2.0,
        1.0,
        1.0,
        -1.8774769894419825,
        0.9094302413068086,
        1.0,
        -2.0,
        1.0,
        1.0,
        -1.9237959892866103,
        0.9263794671616161,
        1.0,
        -2.0,
        1.0,
        1.0,
        -1.978497311228862,
        0.9799894886973378,
    ];
    Sos::from_scipy_dyn(4, flat.iter().map(|&v| F::cast(v)).collect())
}

fn lift<F: Real>(y: ArrayD<F>) -> ArrayD<Complex<F>> {
    y.mapv(|v| Complex::new(v, F::zero()))
}

fn execute<B, F>(backend: &B, op: Op, inputs: &Inputs<F>) -> sigtwin::Result<ArrayD<Complex<F>>>
where
    B: SignalBackend,
    F: Real,
{
    let x = inputs.signal.view();
    let k = inputs.kernel.view();
    Ok(match op {
        Op::Resample { num, kaiser } => {
            let window = kaiser.then(|| Window::Kaiser { beta: F::cast(8.6) });
            lift(backend.resample(x, num, window.as_ref())?.into_dyn())
        }
        Op::ResamplePoly { up, down } => {
            lift(backend.resample_poly(x, up, down, None, 0)?.into_dyn())
        }
        Op::UpFirDn { up: 1, down: 1 } => {
            lift(backend.upfirdn(&[F::one()], x, 1, 1, 0)?.into_dyn())
        }
        Op::UpFirDn { up, down } => lift(
            backend
                .upfirdn(&inputs.bandpass, inputs.chirp.view(), up, down, 0)?
                .into_dyn(),
        ),
        Op::Convolve { mode, method } => lift(backend.convolve(x, k, mode, method)?.into_dyn()),
        Op::Correlate { mode, method } => lift(backend.correlate(x, k, mode, method)?.into_dyn()),
        Op::FftConvolve { mode } => lift(backend.fftconvolve(x, k, mode)?.into_dyn()),
        Op::Convolve2d { mode, boundary } => lift(
            backend
                .convolve2d(inputs.grid.view(), inputs.stencil.view(), mode, boundary)?
                .into_dyn(),
        ),
        Op::Correlate2d { mode, boundary } => lift(
            backend
                .correlate2d(inputs.grid.view(), inputs.box3.view(), mode, boundary)?
                .into_dyn(),
        ),
        Op::Sosfilt => lift(backend.sosfilt(&inputs.sos, inputs.chirp.view())?.into_dyn()),
        Op::Wiener => lift(backend.wiener(x, Some(&[5]), None)?.into_dyn()),
        Op::Wiener2d => lift(backend.wiener(inputs.grid.view(), Some(&[3, 5]), None)?.into_dyn()),
        Op::Hilbert => backend.hilbert(inputs.chirp.view())?.into_dyn(),
        Op::Hilbert2 => backend.hilbert2(inputs.grid.view())?.into_dyn(),
    })
}

fn run_contracts(config: &ContractConfig) -> Result<()> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let root = config
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("target/contracts"));
    let out_dir = root.join(ts.to_string());
    fs::create_dir_all(&out_dir).context("creating contract output directory")?;

    precompile_kernels();
    let inputs_f64 = Inputs::<f64>::realize(config.seed)?;
    let inputs_f32 = Inputs::<f32>::realize(config.seed)?;

    let cases: Vec<Case> = contract_cases()
        .into_iter()
        .filter(|case| {
            config
                .filter
                .as_deref()
                .map_or(true, |f| case.id.contains(f))
        })
        .collect();
    if cases.is_empty() {
        bail!("no contract case matches the filter {:?}", config.filter);
    }
    tracing::info!(cases = cases.len(), iters = config.iters, "running contracts");

    let mut rows = Vec::with_capacity(cases.len());
    for case in &cases {
        let row = match case.dtype {
            Dtype::F64 => run_case(case, &inputs_f64, config.iters)?,
            Dtype::F32 => run_case(case, &inputs_f32, config.iters)?,
        };
        rows.push(row);
    }

    let failed = rows.iter().filter(|r| !r.passed).count();
    let bundle = ContractBundle {
        generated_epoch_seconds: ts,
        iters: config.iters,
        seed: config.seed,
        rayon_threads: rayon::current_num_threads(),
        rows,
    };
    let json_path = out_dir.join("summary.json");
    let json = serde_json::to_string_pretty(&bundle).context("serializing summary")?;
    fs::write(&json_path, json).with_context(|| format!("writing {}", json_path.display()))?;
    write_summary_csv(&out_dir.join("summary.csv"), &bundle.rows)?;
    tracing::info!(dir = %out_dir.display(), failed, "contracts written");

    if failed > 0 {
        bail!("{failed} of {} contract cases violated the oracle", bundle.rows.len());
    }
    Ok(())
}

fn run_case<F: Real>(case: &Case, inputs: &Inputs<F>, iters: usize) -> Result<ContractRow> {
    let accelerated = execute(&Accelerated, case.op, inputs)
        .map_err(|e| anyhow!("case {} accelerated run failed: {e}", case.id))?;
    let accelerated_ns = benchmark_avg_ns(iters, || {
        execute(&Accelerated, case.op, inputs)
            .map(|_| ())
            .map_err(|e| anyhow!("case {} accelerated benchmark failed: {e}", case.id))
    })?;

    let reference = execute(&Reference, case.op, inputs)
        .map_err(|e| anyhow!("case {} reference run failed: {e}", case.id))?;
    let reference_ns = benchmark_avg_ns(iters.div_ceil(10), || {
        execute(&Reference, case.op, inputs)
            .map(|_| ())
            .map_err(|e| anyhow!("case {} reference benchmark failed: {e}", case.id))
    })?;

    let tolerance = if case.exact {
        Tolerance::exact()
    } else {
        Tolerance::for_dtype::<F>()
    };
    let (passed, violations, max_abs) =
        match assert_equivalent(reference.view(), accelerated.view(), tolerance) {
            Ok(report) => (true, 0, report.max_abs_diff),
            Err(SignalError::EquivalenceViolation(d)) => {
                tracing::error!(
                    case = %case.id,
                    index = ?d.index,
                    abs_diff = d.abs_diff,
                    allowed = d.allowed,
                    violations = d.violations,
                    "oracle violation"
                );
                (false, d.violations, d.abs_diff)
            }
            Err(e) => {
                tracing::error!(case = %case.id, error = %e, "oracle rejected outputs");
                (false, reference.len(), f64::NAN)
            }
        };

    let r = widen(&reference);
    let a = widen(&accelerated);
    let row = ContractRow {
        case_id: case.id.clone(),
        op: case.op.name().to_string(),
        dtype: case.dtype,
        shape: accelerated.shape().to_vec(),
        passed,
        violations,
        max_abs,
        mae: mean_abs_error(&r, &a),
        rmse: root_mean_squared_error(&r, &a),
        pearson_r: pearson(
            &r.iter().map(|c| c.re).collect::<Vec<_>>(),
            &a.iter().map(|c| c.re).collect::<Vec<_>>(),
        ),
        accelerated_ns,
        reference_ns,
        speedup: reference_ns / accelerated_ns,
    };
    tracing::info!(
        case = %row.case_id,
        passed,
        max_abs,
        accelerated_ns,
        speedup = row.speedup,
        "contract"
    );
    Ok(row)
}

fn widen<F: Real>(y: &ArrayD<Complex<F>>) -> Vec<Complex<f64>> {
    y.iter()
        .map(|c| Complex::new(c.re.widen(), c.im.widen()))
        .collect()
}

fn benchmark_avg_ns<F>(iters: usize, mut f: F) -> Result<f64>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    for _ in 0..iters {
        f()?;
    }
    Ok(start.elapsed().as_nanos() as f64 / iters as f64)
}

fn mean_abs_error(a: &[Complex<f64>], b: &[Complex<f64>]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).norm())
        .sum::<f64>()
        / a.len() as f64
}

fn root_mean_squared_error(a: &[Complex<f64>], b: &[Complex<f64>]) -> f64 {
    (a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).norm_sqr())
        .sum::<f64>()
        / a.len() as f64)
        .sqrt()
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let da = *x - mean_a;
        let db = *y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        if a == b {
            1.0
        } else {
            0.0
        }
    } else {
        cov / (var_a.sqrt() * var_b.sqrt())
    }
}

fn write_summary_csv(path: &Path, rows: &[ContractRow]) -> Result<()> {
    let mut out = String::new();
    out.push_str("case_id,op,dtype,shape,passed,violations,max_abs,mae,rmse,pearson_r,accelerated_ns,reference_ns,speedup\n");
    for row in rows {
        let shape = row
            .shape
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("x");
        let dtype = match row.dtype {
            Dtype::F32 => "f32",
            Dtype::F64 => "f64",
        };
        out.push_str(&format!(
            "{},{},{},{},{},{},{:.12e},{:.12e},{:.12e},{:.12},{:.3},{:.3},{:.6}\n",
            row.case_id,
            row.op,
            dtype,
            shape,
            row.passed,
            row.violations,
            row.max_abs,
            row.mae,
            row.rmse,
            row.pearson_r,
            row.accelerated_ns,
            row.reference_ns,
            row.speedup,
        ));
    }
    fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}
