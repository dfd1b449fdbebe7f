use anyhow::{anyhow, bail, Context, Result};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use vacf_rs::kernel::KernelLifecycle;
use vacf_rs::signal::correlation::{
    correlation_psd, correlation_psd_angular, AveragedPsdConfig, AveragedPsdKernel,
    IntegrationMethod, SimplePsdConfig, SimplePsdKernel,
};
use vacf_rs::signal::traits::CorrelationPsd1D;

const DEFAULT_PYTHON_BIN: &str = "python";

const PY_REFERENCE_SCRIPT: &str = r#"
import json
import sys
import time
import numpy as np

env = json.loads(sys.stdin.read())
op = env["op"]
iters = int(env["iters"])
p = env["payload"]

sig = np.asarray(p["signal_re"], dtype=float) + 1j * np.asarray(p["signal_im"], dtype=float)
grid = np.asarray(p["frequencies"], dtype=float)
dt = float(p["time_step"])
step = int(p["step"])
method = int(p["method"])


def averaged(sig, freqs, dt, step, method):
    n = len(sig)
    out = []
    for f in freqs:
        w = 2.0 * np.pi * f
        acc = 0j
        i = 0
        while i + step < n:
            rot = np.exp(1j * w * (i * dt))
            rot_ahead = np.exp(1j * w * ((i + step) * dt))
            for j in range(n - i - step):
                here = np.conj(sig[j]) * sig[j + i] * rot
                acc += here
                if method == 0:
                    acc += (np.conj(sig[j]) * sig[j + i + step] * rot_ahead + here) / 2.0
                else:
                    acc += here
            i += step
        out.append(acc.real * dt / (n // step))
    return np.asarray(out)


def simple(sig, omegas, dt, step, method):
    n = len(sig)
    out = []
    for w in omegas:
        integral = 0j
        i = 0
        while i + step + 1 < n:
            span = n - i - step
            rot = np.exp(1j * w * (i * dt))
            rot_ahead = np.exp(1j * w * ((i + step) * dt))
            corr = 0j
            for j in range(span):
                if method == 0:
                    corr += (
                        np.conj(sig[j]) * sig[j + i + step] * rot_ahead
                        + np.conj(sig[j]) * sig[j + i] * rot
                    ) / 2.0
                else:
                    corr += np.conj(sig[j]) * sig[j + i] * rot
            integral += corr / span
            i += step
        out.append(integral.real * dt * step)
    return np.asarray(out)


def _compute():
    if op == "averaged":
        return averaged(sig, grid, dt, step, method)
    if op == "simple":
        return simple(sig, grid, dt, step, method)
    raise RuntimeError(f"unsupported op: {op}")


y = _compute()

t0 = time.perf_counter_ns()
for _ in range(iters):
    _compute()
t1 = time.perf_counter_ns()

print(json.dumps({
    "output": y.tolist(),
    "avg_ns": (t1 - t0) / max(iters, 1),
    "python_version": sys.version.split()[0],
    "numpy_version": np.__version__
}))
"#;

#[derive(Debug, Serialize, Deserialize, Clone)]
struct PythonEval {
    output: Vec<f64>,
    avg_ns: f64,
    python_version: String,
    numpy_version: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ContractRow {
    case_id: String,
    pearson_r: f64,
    mae: f64,
    rmse: f64,
    max_abs: f64,
    rust_kernel_ns: f64,
    rust_wrapper_ns: f64,
    python_ns: f64,
    speedup_vs_python: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContractBundle {
    generated_epoch_seconds: u64,
    python_executable: String,
    python_version: String,
    numpy_version: String,
    rows: Vec<ContractRow>,
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("contracts") => run_contracts(),
        _ => {
            eprintln!("Usage:");
            eprintln!("  cargo run -p xtask -- contracts");
            Ok(())
        }
    }
}

/// Deterministic multi-tone complex trajectory shared by every case.
fn synthetic_trajectory(n: usize, time_step: f64) -> Vec<Complex<f64>> {
    (0..n)
        .map(|j| {
            let t = j as f64 * time_step;
            let mut v = Complex::new(0.0, 0.0);
            for (a, f, p) in [(1.0, 3.0, 0.0), (0.4, 11.0, 0.7), (0.15, 23.0, 1.9)] {
                let theta = 2.0 * std::f64::consts::PI * f * t + p;
                v += Complex::new(a * theta.cos(), a * theta.sin());
            }
            v
        })
        .collect()
}

fn run_contracts() -> Result<()> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let out_dir = PathBuf::from(format!("target/contracts/{ts}"));
    fs::create_dir_all(&out_dir).context("creating contract output directory")?;

    let python_bin = detect_python_bin();

    const TIME_STEP: f64 = 0.01;
    const STEP: usize = 5;
    let signal = synthetic_trajectory(96, TIME_STEP);
    let frequencies: Vec<f64> = (0..24).map(|k| k as f64 * 1.25).collect();
    let signal_re: Vec<f64> = signal.iter().map(|v| v.re).collect();
    let signal_im: Vec<f64> = signal.iter().map(|v| v.im).collect();

    let mut rows = Vec::new();

    for method in [IntegrationMethod::Trapezoid, IntegrationMethod::Rectangular] {
        let method_tag = match method {
            IntegrationMethod::Trapezoid => "trapezoid",
            IntegrationMethod::Rectangular => "rectangular",
        };

        // Averaged strategy (linear-frequency grid).
        {
            let case_id = format!("averaged_{method_tag}_f64");
            let kernel = AveragedPsdKernel::try_new(AveragedPsdConfig {
                time_step: TIME_STEP,
                step: STEP,
                method,
            })?;
            let candidate = kernel
                .run_alloc(signal.as_slice(), frequencies.as_slice())
                .map_err(|e| anyhow!("averaged candidate execution failed: {e}"))?;
            let py = python_reference_eval(
                &python_bin,
                "averaged",
                json!({
                    "signal_re": signal_re,
                    "signal_im": signal_im,
                    "frequencies": frequencies,
                    "time_step": TIME_STEP,
                    "step": STEP,
                    "method": method.code(),
                }),
                20,
            )?;

            let kernel_ns = benchmark_avg_ns(60, || {
                kernel
                    .run_alloc(signal.as_slice(), frequencies.as_slice())
                    .map(|_| ())
                    .map_err(|e| anyhow!("averaged candidate benchmark failed: {e}"))
            })?;
            let wrapper_ns = benchmark_avg_ns(60, || {
                correlation_psd(&signal, &frequencies, TIME_STEP, STEP, method)
                    .map(|_| ())
                    .map_err(|e| anyhow!("averaged wrapper benchmark failed: {e}"))
            })?;

            rows.push(make_row(&case_id, &candidate, &py, kernel_ns, wrapper_ns)?);
        }

        // Simple strategy (angular-frequency grid).
        {
            let case_id = format!("simple_{method_tag}_f64");
            let omegas: Vec<f64> = frequencies
                .iter()
                .map(|f| 2.0 * std::f64::consts::PI * f)
                .collect();
            let kernel = SimplePsdKernel::try_new(SimplePsdConfig {
                time_step: TIME_STEP,
                step: STEP,
                method,
            })?;
            let candidate = kernel
                .run_alloc(signal.as_slice(), omegas.as_slice())
                .map_err(|e| anyhow!("simple candidate execution failed: {e}"))?;
            // The reference's simple op consumes angular frequencies too.
            let py = python_reference_eval(
                &python_bin,
                "simple",
                json!({
                    "signal_re": signal_re,
                    "signal_im": signal_im,
                    "frequencies": omegas,
                    "time_step": TIME_STEP,
                    "step": STEP,
                    "method": method.code(),
                }),
                20,
            )?;

            let kernel_ns = benchmark_avg_ns(60, || {
                kernel
                    .run_alloc(signal.as_slice(), omegas.as_slice())
                    .map(|_| ())
                    .map_err(|e| anyhow!("simple candidate benchmark failed: {e}"))
            })?;
            let wrapper_ns = benchmark_avg_ns(60, || {
                correlation_psd_angular(&signal, &omegas, TIME_STEP, STEP, method)
                    .map(|_| ())
                    .map_err(|e| anyhow!("simple wrapper benchmark failed: {e}"))
            })?;

            rows.push(make_row(&case_id, &candidate, &py, kernel_ns, wrapper_ns)?);
        }
    }

    let (python_version, numpy_version) = probe_versions(&python_bin)?;

    let bundle = ContractBundle {
        generated_epoch_seconds: ts,
        python_executable: python_bin.to_string_lossy().into_owned(),
        python_version,
        numpy_version,
        rows,
    };

    write_summary_csv(&out_dir.join("summary.csv"), &bundle.rows)?;
    fs::write(
        out_dir.join("summary.json"),
        serde_json::to_vec_pretty(&bundle).context("serializing summary bundle")?,
    )
    .context("writing summary.json")?;

    println!("Contract artifacts generated in: {}", out_dir.display());
    println!("  - {}", out_dir.join("summary.csv").display());
    println!("  - {}", out_dir.join("summary.json").display());
    println!("  - cases: {}", bundle.rows.len());

    Ok(())
}

fn detect_python_bin() -> PathBuf {
    PathBuf::from(DEFAULT_PYTHON_BIN)
}

fn probe_versions(python_bin: &Path) -> Result<(String, String)> {
    let eval = run_python_eval(
        python_bin,
        r#"
import json, sys
import numpy
payload = json.loads(sys.stdin.read())
print(json.dumps({
    "output": [],
    "avg_ns": 0.0,
    "python_version": sys.version.split()[0],
    "numpy_version": numpy.__version__
}))
"#,
        json!({}),
    )?;
    Ok((eval.python_version, eval.numpy_version))
}

fn python_reference_eval(
    python_bin: &Path,
    op: &str,
    payload: serde_json::Value,
    iters: usize,
) -> Result<PythonEval> {
    run_python_eval(
        python_bin,
        PY_REFERENCE_SCRIPT,
        json!({
            "op": op,
            "iters": iters,
            "payload": payload
        }),
    )
}

fn run_python_eval(
    python_bin: &Path,
    script: &str,
    payload: serde_json::Value,
) -> Result<PythonEval> {
    let mut child = Command::new(python_bin)
        .arg("-c")
        .arg(script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning python interpreter at {}", python_bin.display()))?;

    {
        let stdin = child.stdin.as_mut().context("opening python stdin")?;
        let payload_bytes = serde_json::to_vec(&payload).context("serializing python payload")?;
        stdin
            .write_all(&payload_bytes)
            .context("writing payload to python stdin")?;
    }

    let output = child
        .wait_with_output()
        .context("waiting for python process")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("python execution failed: {stderr}");
    }
    let stdout = String::from_utf8(output.stdout).context("parsing python stdout utf8")?;
    let parsed: PythonEval = serde_json::from_str(stdout.trim()).context("parsing python json")?;
    Ok(parsed)
}

fn benchmark_avg_ns(iters: usize, mut run: impl FnMut() -> Result<()>) -> Result<f64> {
    let start = Instant::now();
    for _ in 0..iters {
        run()?;
    }
    Ok(start.elapsed().as_nanos() as f64 / iters.max(1) as f64)
}

fn make_row(
    case_id: &str,
    candidate: &[f64],
    py: &PythonEval,
    kernel_ns: f64,
    wrapper_ns: f64,
) -> Result<ContractRow> {
    if candidate.len() != py.output.len() {
        bail!(
            "case `{case_id}`: candidate length {} != reference length {}",
            candidate.len(),
            py.output.len()
        );
    }
    let (pearson_r, mae, rmse, max_abs) = error_metrics(candidate, &py.output);
    Ok(ContractRow {
        case_id: case_id.to_string(),
        pearson_r,
        mae,
        rmse,
        max_abs,
        rust_kernel_ns: kernel_ns,
        rust_wrapper_ns: wrapper_ns,
        python_ns: py.avg_ns,
        speedup_vs_python: py.avg_ns / kernel_ns.max(1.0),
    })
}

fn error_metrics(candidate: &[f64], reference: &[f64]) -> (f64, f64, f64, f64) {
    let n = candidate.len().max(1) as f64;
    let mean_c = candidate.iter().sum::<f64>() / n;
    let mean_r = reference.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_c = 0.0;
    let mut var_r = 0.0;
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut max_abs: f64 = 0.0;
    for (&c, &r) in candidate.iter().zip(reference.iter()) {
        let dc = c - mean_c;
        let dr = r - mean_r;
        cov += dc * dr;
        var_c += dc * dc;
        var_r += dr * dr;
        let d = (c - r).abs();
        abs_sum += d;
        sq_sum += d * d;
        max_abs = max_abs.max(d);
    }

    let pearson_r = if var_c > 0.0 && var_r > 0.0 {
        cov / (var_c.sqrt() * var_r.sqrt())
    } else {
        1.0
    };
    (pearson_r, abs_sum / n, (sq_sum / n).sqrt(), max_abs)
}

fn write_summary_csv(path: &Path, rows: &[ContractRow]) -> Result<()> {
    let mut csv = String::from(
        "case_id,pearson_r,mae,rmse,max_abs,rust_kernel_ns,rust_wrapper_ns,python_ns,speedup_vs_python\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            row.case_id,
            row.pearson_r,
            row.mae,
            row.rmse,
            row.max_abs,
            row.rust_kernel_ns,
            row.rust_wrapper_ns,
            row.python_ns,
            row.speedup_vs_python
        ));
    }
    fs::write(path, csv).context("writing summary.csv")
}
