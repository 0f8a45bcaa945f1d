//! Ejecución de procesos externos con tiempo límite.

use std::borrow::Cow;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::AdapterError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const STDERR_EXCERPT: usize = 400;

#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Lanza `command` y espera como máximo `timeout`. Al vencer el plazo el
/// proceso se termina y se devuelve [`AdapterError::Timeout`].
///
/// Las tuberías se vacían en hilos propios para que el hijo no se bloquee
/// con salidas grandes.
pub fn run_with_timeout(
    tool: &'static str,
    command: &mut Command,
    timeout: Duration,
) -> Result<ToolOutput, AdapterError> {
    debug!(herramienta = tool, comando = ?command, "Ejecutando herramienta externa");

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| AdapterError::Spawn {
            tool,
            reason: e.to_string(),
        })?;

    let stdout = drain(tool, child.stdout.take())?;
    let stderr = drain(tool, child.stderr.take())?;

    let status = wait_with_deadline(tool, &mut child, timeout);

    let stdout = collect(tool, stdout)?;
    let stderr = collect(tool, stderr)?;

    Ok(ToolOutput {
        status: status?,
        stdout,
        stderr,
    })
}

/// Igual que [`run_with_timeout`] pero un estado distinto de cero es un error.
pub fn run_checked(
    tool: &'static str,
    command: &mut Command,
    timeout: Duration,
) -> Result<ToolOutput, AdapterError> {
    let output = run_with_timeout(tool, command, timeout)?;
    if output.status.success() {
        return Ok(output);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
    Err(AdapterError::Tool {
        tool,
        status: output.status.to_string(),
        stderr: excerpt,
    })
}

/// Ruta lista para pasarse como argumento posicional: si empieza por `-` se
/// antepone `./` para que la herramienta no la lea como una opción.
pub fn guarded_path(path: &Path) -> Cow<'_, Path> {
    if path.as_os_str().as_encoded_bytes().starts_with(b"-") {
        Cow::Owned(PathBuf::from(".").join(path))
    } else {
        Cow::Borrowed(path)
    }
}

fn wait_with_deadline(
    tool: &'static str,
    child: &mut Child,
    timeout: Duration,
) -> Result<ExitStatus, AdapterError> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(AdapterError::Timeout {
                tool,
                secs: timeout.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

fn drain<R>(tool: &'static str, pipe: Option<R>) -> Result<Drain, AdapterError>
where
    R: Read + Send + 'static,
{
    let mut pipe = pipe.ok_or_else(|| AdapterError::Spawn {
        tool,
        reason: "tubería no disponible".to_string(),
    })?;
    Ok(thread::spawn(move || {
        let mut buffer = Vec::new();
        pipe.read_to_end(&mut buffer)?;
        Ok(buffer)
    }))
}

fn collect(tool: &'static str, handle: Drain) -> Result<Vec<u8>, AdapterError> {
    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err(AdapterError::Spawn {
            tool,
            reason: "el hilo lector terminó inesperadamente".to_string(),
        }),
    }
}
