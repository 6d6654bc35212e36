use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::DefaultBodyLimit;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::Mutex, time::timeout};

use macsweep::{
    disk_usage_line, env_truthy, format_bytes, is_elevated, load_config, preview_targets,
    run_clean, Config, LargeFile, Message, ProgressSink, RunOverrides, Summary, TargetsPreview,
};

#[derive(Clone)]
struct AppState {
    csrf_token: String,
    inner: Arc<InnerState>,
}

struct InnerState {
    history: Mutex<Vec<RunRecord>>,              // latest-first
    config_override: Mutex<Option<Config>>,      // in-memory override, if any
    jobs: Mutex<HashMap<String, Job>>,           // async run jobs
}

/// Live state of one async run. The output buffer and counters are shared with
/// the draining task so the page can poll them mid-run.
struct Job {
    status: String, // running|completed|failed|timeout
    started_at: u64,
    finished_at: Option<u64>,
    result: Option<RunResponse>,
    error: Option<String>,
    output: Arc<StdMutex<Vec<String>>>,
    current_action: Arc<StdMutex<String>>,
    space_freed: Arc<AtomicU64>,
}

#[derive(Debug, Serialize)]
struct JobView {
    id: String,
    status: String,
    started_at: u64,
    finished_at: Option<u64>,
    result: Option<RunResponse>,
    error: Option<String>,
    output: Vec<String>,
    current_action: String,
    space_freed: u64,
}

#[derive(Debug, Deserialize, Clone)]
struct RunRequest {
    dry_run: bool,
    verbose: bool,
    quiet: bool,
    skip_trash: bool,
    skip_maintenance: bool,
    find_large_files: bool,
}

#[derive(Debug, Serialize, Clone)]
struct RunResponse {
    ok: bool,
    exit_code: i32,
    stdout: String,
    files_deleted: u64,
    dirs_deleted: u64,
    bytes_freed: u64,
    bytes_freed_display: String,
    step_bytes: Vec<(String, u64)>,
    large_files: Vec<LargeFile>,
    elapsed: f64,
    dry_run: bool,
}

#[derive(Debug, Serialize)]
struct CsrfResponse {
    token: String,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    commit: &'static str,
    describe: &'static str,
    build_unix_time: &'static str,
    target: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionInfo {
    version: &'static str,
    commit: &'static str,
    describe: &'static str,
    build_unix_time: &'static str,
    target: &'static str,
}

#[derive(Debug, Serialize)]
struct PermissionsInfo {
    elevated: bool,
    default_skip_trash: bool,
    default_skip_maintenance: bool,
}

#[derive(Debug, Serialize)]
struct DiskInfo {
    line: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
struct RunRecord {
    id: Option<String>,
    started_at: u64,
    finished_at: u64,
    response: RunResponse,
}

#[derive(Debug, Serialize)]
struct JobIdResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct ConfigInfo {
    loaded: Config,
    override_applied: Option<Config>,
}

// ---------- Helpers ----------

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut s = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        s.push(HEX[(b >> 4) as usize] as char);
        s.push(HEX[(b & 0x0f) as usize] as char);
    }
    s
}

fn generate_csrf_token() -> String {
    let mut buf = [0u8; 32];
    OsRng.fill_bytes(&mut buf);
    hex_encode(&buf)
}

fn ensure_loopback(addr: &SocketAddr) -> Result<(), String> {
    if addr.ip().is_loopback() {
        return Ok(());
    }
    if env_truthy("MACSWEEP_WEB_ALLOW_NON_LOCAL") {
        return Ok(());
    }
    Err(format!(
        "Refusing to bind to non-loopback address {}. Set MACSWEEP_WEB_ALLOW_NON_LOCAL=1 to override.",
        addr
    ))
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("internal error: {}", err),
    )
}

fn csrf_check(headers: &HeaderMap, state: &AppState) -> Result<(), (StatusCode, String)> {
    let hdr = headers.get("x-csrf-token").and_then(|v| v.to_str().ok());
    if hdr != Some(state.csrf_token.as_str()) {
        return Err((StatusCode::FORBIDDEN, "missing or invalid CSRF token".into()));
    }
    Ok(())
}

fn run_timeout() -> Duration {
    let secs = std::env::var("MACSWEEP_WEB_RUN_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(600);
    Duration::from_secs(secs)
}

fn summary_to_response(summary: Summary, stdout: String) -> RunResponse {
    RunResponse {
        ok: true,
        exit_code: 0,
        stdout,
        files_deleted: summary.files_deleted,
        dirs_deleted: summary.dirs_deleted,
        bytes_freed: summary.bytes_freed,
        bytes_freed_display: format_bytes(summary.bytes_freed),
        step_bytes: summary.step_bytes,
        large_files: summary.large_files,
        elapsed: summary.elapsed.as_secs_f64(),
        dry_run: summary.dry_run,
    }
}

async fn build_cfg_and_overrides(state: &AppState, req: &RunRequest) -> (Config, RunOverrides) {
    let base_cfg = load_config();
    let override_opt = { state.inner.config_override.lock().await.clone() };
    let mut cfg: Config = override_opt.unwrap_or(base_cfg);
    if req.dry_run {
        cfg.dry_run = true;
    }
    if req.verbose {
        cfg.verbose = true;
        cfg.quiet = false;
    }
    if req.quiet {
        cfg.quiet = true;
        cfg.verbose = false;
    }

    let overrides = RunOverrides {
        skip_trash: req.skip_trash || env_truthy("MACSWEEP_SKIP_TRASH"),
        skip_maintenance: req.skip_maintenance || env_truthy("MACSWEEP_SKIP_MAINTENANCE"),
        find_large_files: req.find_large_files,
    };
    (cfg, overrides)
}

async fn push_history(
    state: &AppState,
    id: Option<String>,
    started_at: u64,
    finished_at: u64,
    resp: RunResponse,
) {
    let mut h = state.inner.history.lock().await;
    h.insert(
        0,
        RunRecord {
            id,
            started_at,
            finished_at,
            response: resp,
        },
    );
    const MAX_HIST: usize = 50;
    if h.len() > MAX_HIST {
        h.truncate(MAX_HIST);
    }
}

// ---------- Main ----------

#[tokio::main]
async fn main() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(false)
        .try_init();

    // Per-process CSRF token required on state-changing requests
    let csrf_token = generate_csrf_token();
    let state = AppState {
        csrf_token,
        inner: Arc::new(InnerState {
            history: Mutex::new(Vec::new()),
            config_override: Mutex::new(None),
            jobs: Mutex::new(HashMap::new()),
        }),
    };

    let app = Router::new()
        .route("/", get(ui))
        .route("/api/health", get(health))
        .route("/api/version", get(version))
        .route("/api/permissions", get(permissions))
        .route("/api/csrf", get(csrf))
        .route(
            "/api/config",
            get(get_config).put(put_config).delete(delete_config),
        )
        .route("/api/disk", get(disk))
        .route("/api/preview", post(preview_handler))
        .route("/api/history", get(history))
        .route("/api/run", post(run_cleaner))
        .route("/api/run-async", post(run_cleaner_async))
        .route("/api/job/:id", get(job_status).delete(delete_job))
        .layer(DefaultBodyLimit::max(32 * 1024))
        .with_state(state);

    let bind_addr =
        std::env::var("MACSWEEP_WEB_BIND").unwrap_or_else(|_| "127.0.0.1:7979".to_string());
    let addr: SocketAddr = bind_addr.parse().expect("Invalid MACSWEEP_WEB_BIND address");
    if let Err(e) = ensure_loopback(&addr) {
        eprintln!("macsweep-web: {}", e);
        return;
    }
    let listener = TcpListener::bind(addr).await.expect("failed to bind listener");
    if let Ok(local) = listener.local_addr() {
        println!("macsweep-web: listening on http://{}", local);
    }
    axum::serve(listener, app).await.expect("server error");
}

// ---------- Handlers ----------

async fn ui() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT").unwrap_or("unknown"),
        describe: option_env!("GIT_DESCRIBE").unwrap_or("unknown"),
        build_unix_time: option_env!("BUILD_UNIX_TIME").unwrap_or("0"),
        target: option_env!("BUILD_TARGET").unwrap_or("unknown"),
    })
}

async fn version() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT").unwrap_or("unknown"),
        describe: option_env!("GIT_DESCRIBE").unwrap_or("unknown"),
        build_unix_time: option_env!("BUILD_UNIX_TIME").unwrap_or("0"),
        target: option_env!("BUILD_TARGET").unwrap_or("unknown"),
    })
}

async fn permissions() -> Json<PermissionsInfo> {
    Json(PermissionsInfo {
        elevated: is_elevated(),
        default_skip_trash: env_truthy("MACSWEEP_SKIP_TRASH"),
        default_skip_maintenance: env_truthy("MACSWEEP_SKIP_MAINTENANCE"),
    })
}

async fn csrf(State(state): State<AppState>) -> Json<CsrfResponse> {
    Json(CsrfResponse {
        token: state.csrf_token.clone(),
    })
}

async fn disk() -> Json<DiskInfo> {
    Json(DiskInfo {
        line: disk_usage_line(),
    })
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigInfo> {
    let loaded = load_config();
    let override_applied = state.inner.config_override.lock().await.clone();
    Json(ConfigInfo {
        loaded,
        override_applied,
    })
}

async fn put_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(cfg): Json<Config>,
) -> Result<Json<ConfigInfo>, (StatusCode, String)> {
    csrf_check(&headers, &state)?;
    {
        let mut ov = state.inner.config_override.lock().await;
        *ov = Some(cfg.clone());
    }
    Ok(get_config(State(state)).await)
}

async fn delete_config(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, String)> {
    csrf_check(&headers, &state)?;
    {
        let mut ov = state.inner.config_override.lock().await;
        *ov = None;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn preview_handler(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Result<Json<TargetsPreview>, (StatusCode, String)> {
    // Read-only, no CSRF required
    let (cfg, _overrides) = build_cfg_and_overrides(&state, &req).await;
    Ok(Json(preview_targets(&cfg)))
}

async fn history(State(state): State<AppState>) -> Json<Vec<RunRecord>> {
    let h = state.inner.history.lock().await;
    Json(h.clone())
}

async fn run_cleaner(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunResponse>, (StatusCode, String)> {
    csrf_check(&headers, &state)?;

    let (cfg, overrides) = build_cfg_and_overrides(&state, &req).await;

    // Heavy sync engine on a blocking thread; the queue is drained afterwards.
    let (tx, rx) = channel();
    let handle = tokio::task::spawn_blocking(move || {
        let sink = ProgressSink::new(tx);
        run_clean(&cfg, &overrides, &sink)
    });

    let started_at = now_unix();
    let summary = match timeout(run_timeout(), handle).await {
        Ok(join_res) => join_res.map_err(internal_error)?,
        Err(_) => {
            return Err((
                StatusCode::REQUEST_TIMEOUT,
                format!("cleaner timed out after {:?}", run_timeout()),
            ));
        }
    };

    let stdout: String = rx
        .try_iter()
        .filter_map(|m| match m {
            Message::Line(s) => Some(s),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    let resp = summary_to_response(summary, stdout);
    let finished_at = now_unix();
    push_history(&state, None, started_at, finished_at, resp.clone()).await;
    Ok(Json(resp))
}

async fn run_cleaner_async(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RunRequest>,
) -> Result<Json<JobIdResponse>, (StatusCode, String)> {
    csrf_check(&headers, &state)?;

    let id = {
        let mut b = [0u8; 8];
        OsRng.fill_bytes(&mut b);
        hex_encode(&b)
    };
    let (cfg, overrides) = build_cfg_and_overrides(&state, &req).await;
    let started_at = now_unix();

    let output = Arc::new(StdMutex::new(Vec::new()));
    let current_action = Arc::new(StdMutex::new(String::from("Starting cleanup...")));
    let space_freed = Arc::new(AtomicU64::new(0));
    {
        let mut jobs = state.inner.jobs.lock().await;
        jobs.insert(
            id.clone(),
            Job {
                status: "running".into(),
                started_at,
                finished_at: None,
                result: None,
                error: None,
                output: Arc::clone(&output),
                current_action: Arc::clone(&current_action),
                space_freed: Arc::clone(&space_freed),
            },
        );
    }

    let state2 = state.clone();
    let id_for_task = id.clone();
    tokio::spawn(async move {
        let (tx, rx) = channel();
        let worker = tokio::task::spawn_blocking(move || {
            let sink = ProgressSink::new(tx);
            run_clean(&cfg, &overrides, &sink)
        });

        // Forward the worker's queue into the shared buffers the page polls.
        let out2 = Arc::clone(&output);
        let action2 = Arc::clone(&current_action);
        let freed2 = Arc::clone(&space_freed);
        let drain = tokio::task::spawn_blocking(move || {
            for msg in rx {
                match msg {
                    Message::Line(s) => {
                        if let Ok(mut v) = out2.lock() {
                            v.push(s);
                        }
                    }
                    Message::Status(s) => {
                        if let Ok(mut a) = action2.lock() {
                            *a = s;
                        }
                    }
                    Message::SpaceFreed(n) => freed2.store(n, Ordering::Relaxed),
                }
            }
        });

        let finished_at;
        let mut status = "completed".to_string();
        let mut error: Option<String> = None;
        let result: Option<RunResponse>;
        match timeout(run_timeout(), worker).await {
            Ok(join_res) => match join_res {
                Ok(summary) => {
                    let _ = drain.await;
                    let stdout = output
                        .lock()
                        .map(|v| v.join("\n"))
                        .unwrap_or_default();
                    let resp = summary_to_response(summary, stdout);
                    finished_at = now_unix();
                    result = Some(resp.clone());
                    push_history(&state2, Some(id_for_task.clone()), started_at, finished_at, resp)
                        .await;
                }
                Err(e) => {
                    finished_at = now_unix();
                    status = "failed".into();
                    error = Some(format!("internal error: {}", e));
                    result = None;
                }
            },
            Err(_) => {
                // The engine cannot be interrupted; the job is just abandoned.
                finished_at = now_unix();
                status = "timeout".into();
                error = Some(format!("cleaner timed out after {:?}", run_timeout()));
                result = None;
            }
        }

        let mut jobs = state2.inner.jobs.lock().await;
        if let Some(entry) = jobs.get_mut(&id_for_task) {
            entry.status = status;
            entry.finished_at = Some(finished_at);
            entry.result = result;
            entry.error = error;
        }
    });

    Ok(Json(JobIdResponse { id }))
}

async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, (StatusCode, String)> {
    let jobs = state.inner.jobs.lock().await;
    if let Some(j) = jobs.get(&id) {
        let output = j.output.lock().map(|v| v.clone()).unwrap_or_default();
        let current_action = j
            .current_action
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default();
        return Ok(Json(JobView {
            id,
            status: j.status.clone(),
            started_at: j.started_at,
            finished_at: j.finished_at,
            result: j.result.clone(),
            error: j.error.clone(),
            output,
            current_action,
            space_freed: j.space_freed.load(Ordering::Relaxed),
        }));
    }
    Err((StatusCode::NOT_FOUND, "job not found".into()))
}

async fn delete_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    csrf_check(&headers, &state)?;
    let mut jobs = state.inner.jobs.lock().await;
    if jobs.remove(&id).is_some() {
        return Ok(StatusCode::NO_CONTENT);
    }
    Err((StatusCode::NOT_FOUND, "job not found".into()))
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>macsweep - Cache Cleaner</title>
  <meta http-equiv="Content-Security-Policy" content="default-src 'self'; img-src 'self' data:; style-src 'self' 'unsafe-inline'; script-src 'self' 'unsafe-inline'; connect-src 'self'; frame-ancestors 'none'; base-uri 'self'; form-action 'self'">
  <style>
    :root{--bg:#f8f9fa;--card:#ffffff;--text:#212529;--muted:#666666;--accent:#007bff;--good:#28a745;--warn:#ffc107;--bad:#dc3545}
    *{box-sizing:border-box}
    body{margin:0;background:var(--bg);color:var(--text);font:16px/1.5 -apple-system,system-ui,Segoe UI,Roboto,Arial}
    .wrap{max-width:980px;margin:0 auto;padding:32px}
    header h1{margin:.2rem 0 0;font-size:1.9rem}
    header p{margin:.2rem 0 1rem;color:var(--muted)}
    .grid{display:grid;grid-template-columns:1fr;gap:16px}
    @media (min-width:960px){.grid{grid-template-columns:1fr 1fr}}
    .card{background:var(--card);border:1px solid #dee2e6;border-radius:14px;padding:16px 16px 12px;box-shadow:0 4px 12px rgba(0,0,0,.06)}
    .row{display:flex;gap:12px;align-items:center;margin:8px 0}
    .row label{flex:1}
    .actions{display:flex;gap:12px;flex-wrap:wrap;margin-top:12px}
    button{background:var(--accent);color:#fff;border:none;border-radius:10px;padding:10px 14px;font-weight:600;cursor:pointer}
    button[disabled]{opacity:.55;cursor:not-allowed}
    .btn-good{background:var(--good)}
    .btn-warn{background:var(--warn);color:#212529}
    .btn-sec{background:#e9ecef;color:var(--text)}
    .log{white-space:pre-wrap;background:#212529;color:#e6edf3;border-radius:10px;padding:12px;min-height:220px;font:13px/1.45 ui-monospace,SF Mono,Menlo,monospace}
    .badge{display:inline-block;background:#e9ecef;padding:2px 8px;border-radius:99px;color:var(--muted);font-size:.8rem}
    .status-ok{color:var(--good)}.status-bad{color:var(--bad)}
    .hint{color:var(--muted);font-size:.9rem}
    .statusline{display:flex;justify-content:space-between;margin:8px 0;color:var(--muted)}
  </style>
</head>
<body>
  <div class="wrap">
    <header>
      <span class="badge">Local only</span>
      <h1>macsweep</h1>
      <p>Free up disk space by cleaning cache and temporary files. Use <b>Dry Run</b> to preview.</p>
    </header>

    <div class="grid">
      <section class="card">
        <h2>Options</h2>
        <div class="row"><label><input type="checkbox" id="dry_run" checked> Dry run (safe preview)</label></div>
        <div class="row"><label><input type="checkbox" id="verbose" checked> Verbose output</label></div>
        <div class="row"><label><input type="checkbox" id="skip_trash"> Skip emptying trash</label></div>
        <div class="row"><label><input type="checkbox" id="skip_maintenance"> Skip system maintenance</label></div>
        <div class="row"><label><input type="checkbox" id="find_large_files"> Find large files</label></div>
        <div class="actions">
          <button class="btn-warn" id="scan">Scan Only</button>
          <button class="btn-good" id="safe">Safe Clean</button>
          <button id="deep">Deep Clean</button>
        </div>
        <div class="actions">
          <button id="run">Start Cleaning</button>
          <button class="btn-sec" id="stop">Stop</button>
          <button class="btn-sec" id="preview">Preview Targets</button>
        </div>
        <p class="hint">Deep Clean also empties the trash and runs macOS maintenance (needs administrator privileges).</p>
      </section>

      <section class="card">
        <h2>Disk Usage</h2>
        <div id="disk" class="hint">Loading disk information...</div>
        <h2>Summary</h2>
        <div id="summary"></div>
      </section>

      <section class="card" style="grid-column:1/-1">
        <h2>Output</h2>
        <div class="statusline">
          <span id="status">Ready to clean</span>
          <span id="freed">Space freed: 0 B</span>
        </div>
        <pre id="log" class="log"></pre>
      </section>
    </div>
  </div>

  <script>
  const $ = sel => document.querySelector(sel);
  const log = msg => { $('#log').textContent = msg; };
  const setStatus = s => { $('#status').textContent = s; };
  const setFreed = b => { $('#freed').textContent = 'Space freed: ' + fmtBytes(b); };
  const fmtBytes = b => {
    const units = ['B','KB','MB','GB','TB'];
    let i = 0, n = b;
    while (n >= 1024 && i < units.length - 1) { n /= 1024; i++; }
    return i === 0 ? b + ' B' : n.toFixed(2) + ' ' + units[i];
  };
  const setSummary = data => {
    const steps = (data.step_bytes||[]).map(([t, b]) => `<li>${t}: ${fmtBytes(b)}</li>`).join('');
    const large = (data.large_files||[]).slice(0, 10).map(f => `<li>${fmtBytes(f.size)} - <code>${f.path}</code></li>`).join('');
    $('#summary').innerHTML = `
      <p><strong>Files deleted:</strong> ${data.files_deleted}</p>
      <p><strong>Directories deleted:</strong> ${data.dirs_deleted}</p>
      <p><strong>Space freed:</strong> ${data.bytes_freed_display}</p>
      <p><strong>Elapsed:</strong> ${data.elapsed.toFixed(2)}s</p>
      <p><strong>Dry run:</strong> ${data.dry_run ? 'Yes' : 'No'}</p>
      <details open><summary><strong>Per step</strong></summary><ul>${steps}</ul></details>
      ${large ? `<details><summary><strong>Large files</strong></summary><ul>${large}</ul></details>` : ''}
    `;
  };

  let CSRF_TOKEN = null;
  let running = false;
  async function ensureCsrf(){
    if (CSRF_TOKEN) return;
    try {
      const res = await fetch('/api/csrf');
      const data = await res.json();
      CSRF_TOKEN = data.token;
    } catch (e) {
      console.warn('CSRF token fetch failed', e);
    }
  }

  async function refreshDisk(){
    try {
      const res = await fetch('/api/disk');
      const data = await res.json();
      $('#disk').textContent = data.line || 'Disk information unavailable';
    } catch (e) {
      $('#disk').textContent = 'Error getting disk info: ' + e;
    }
  }

  function options(){
    return {
      dry_run: $('#dry_run').checked,
      verbose: $('#verbose').checked,
      quiet: false,
      skip_trash: $('#skip_trash').checked,
      skip_maintenance: $('#skip_maintenance').checked,
      find_large_files: $('#find_large_files').checked,
    };
  }

  async function startRun(){
    if (running) return;
    running = true;
    $('#run').disabled = true;
    log('Starting ...');
    setStatus('Starting cleanup...');
    await ensureCsrf();
    try {
      const res = await fetch('/api/run-async', { method:'POST', headers:{'Content-Type':'application/json','X-CSRF-Token': (CSRF_TOKEN||'')}, body: JSON.stringify(options()) });
      const data = await res.json();
      poll(data.id);
    } catch (e) {
      running = false;
      $('#run').disabled = false;
      log('Request failed: ' + e);
    }
  }

  // The engine streams its print lines into the job; poll them at a fixed interval.
  async function poll(id){
    try {
      const res = await fetch('/api/job/' + id);
      const job = await res.json();
      log(job.output.join('\n'));
      setStatus(job.current_action);
      setFreed(job.space_freed);
      if (job.status === 'running') {
        setTimeout(() => poll(id), 500);
        return;
      }
      if (job.result) {
        setSummary(job.result);
        setStatus('Cleanup complete!');
        refreshDisk();
      } else {
        setStatus('Error: ' + (job.error || job.status));
      }
    } catch (e) {
      setStatus('Poll failed: ' + e);
    }
    running = false;
    $('#run').disabled = false;
  }

  $('#run').addEventListener('click', startRun);

  $('#scan').addEventListener('click', () => {
    $('#dry_run').checked = true;
    $('#verbose').checked = true;
    $('#find_large_files').checked = true;
    startRun();
  });

  $('#safe').addEventListener('click', () => {
    $('#dry_run').checked = false;
    $('#skip_trash').checked = true;
    $('#skip_maintenance').checked = true;
    startRun();
  });

  $('#deep').addEventListener('click', () => {
    const ok = confirm('Deep clean will remove all cache files, empty trash, and run system maintenance.\n\nThis is safe but may require administrator privileges.\n\nContinue?');
    if (!ok) return;
    $('#dry_run').checked = false;
    $('#skip_trash').checked = false;
    $('#skip_maintenance').checked = false;
    startRun();
  });

  $('#stop').addEventListener('click', () => {
    alert('Cleaning operations cannot be stopped mid-process for safety.\nPlease wait for the current operation to complete.');
  });

  $('#preview').addEventListener('click', async () => {
    try {
      const res = await fetch('/api/preview', { method:'POST', headers:{'Content-Type':'application/json'}, body: JSON.stringify(options()) });
      const data = await res.json();
      const text = data.steps.map(s => s.title + '\n' + s.dirs.map(d => '  ' + d).join('\n')).join('\n\n');
      log(text || 'No existing targets.');
    } catch (e) {
      log('Preview failed: ' + e);
    }
  });

  refreshDisk();
  </script>
</body>
</html>"#;
