//! Command runners for the `media-transfer` binary.

pub(crate) mod config;
pub(crate) mod endpoints;
mod progress;
mod save;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use media_transfer::format_file_size;
use media_transfer::transfer::{
    AuthToken, NamedBlob, TransferEngine, TransferHandle, TransferOutcome, TransferRequest,
    UploadReceipt, WatchNotifier,
};
use tracing::{debug, info, warn};

use endpoints::Backend;

/// Exit code for a transfer stopped by Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

/// Everything a command needs to start transfers.
#[derive(Debug)]
pub(crate) struct AppContext {
    pub engine: TransferEngine,
    pub backend: Backend,
    pub token: Option<AuthToken>,
    pub show_progress: bool,
}

impl AppContext {
    fn authorize(&self, request: TransferRequest) -> TransferRequest {
        match &self.token {
            Some(token) => request.with_auth_token(token.clone()),
            None => request,
        }
    }

    /// Starts `request` with a progress UI and waits for it, cancelling on
    /// Ctrl-C.
    async fn execute(&self, request: TransferRequest, label: &str) -> TransferOutcome {
        let (notifier, rx) = WatchNotifier::channel();
        let ui = progress::spawn_progress_ui(self.show_progress, label, rx);
        let handle = self.engine.start_transfer(request, notifier);
        let outcome = await_outcome(handle).await;
        if let Some(ui) = ui
            && let Err(e) = ui.await
        {
            debug!(error = %e, "progress UI task ended abnormally");
        }
        outcome
    }
}

async fn await_outcome(handle: TransferHandle) -> TransferOutcome {
    let mut state = handle.watch_state();
    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());
    let mut interrupted = false;
    loop {
        if state.borrow_and_update().status.is_terminal() {
            break;
        }
        tokio::select! {
            signal = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                if signal.is_ok() {
                    warn!("Interrupted, cancelling transfer");
                    handle.cancel();
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    handle.result().await
}

/// `download` command.
pub(crate) async fn run_download(
    ctx: &AppContext,
    media_path: &str,
    output_dir: &Path,
    name: Option<&str>,
) -> Result<ExitCode> {
    let url = ctx.backend.media_stream_url(media_path)?;
    let mut request = TransferRequest::download(url.as_str());
    if let Some(name) = name {
        request = request.with_destination_hint(name);
    }
    let request = ctx.authorize(request);

    let label = name.unwrap_or_else(|| media_path.rsplit('/').next().unwrap_or(media_path));
    info!(path = media_path, "Downloading");
    match ctx.execute(request, label).await {
        TransferOutcome::Success {
            payload,
            final_name,
        } => {
            let saved_as = name.unwrap_or(&final_name);
            let path = save::save_payload(output_dir, saved_as, &payload).await?;
            info!(
                path = %path.display(),
                size = %format_file_size(payload.len() as u64),
                "Download complete"
            );
            Ok(ExitCode::SUCCESS)
        }
        TransferOutcome::Cancelled => {
            warn!("Download cancelled");
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        TransferOutcome::Failed(error) => Err(error).context("Download failed"),
    }
}

/// `upload` command.
pub(crate) async fn run_upload(ctx: &AppContext, files: &[PathBuf], dest: &str) -> Result<ExitCode> {
    let mut blobs = Vec::with_capacity(files.len());
    let mut total: u64 = 0;
    for file in files {
        let data = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read '{}'", file.display()))?;
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("'{}' has no file name", file.display()))?;
        total += data.len() as u64;
        blobs.push(NamedBlob::new(name, data));
    }

    let url = ctx.backend.upload_url()?;
    let label = match blobs.as_slice() {
        [single] => single.name().to_string(),
        many => format!("{} files", many.len()),
    };
    let request = ctx.authorize(
        TransferRequest::upload(url.as_str(), blobs).with_destination_path(dest),
    );

    info!(
        files = files.len(),
        size = %format_file_size(total),
        dest,
        "Uploading"
    );
    match ctx.execute(request, &label).await {
        TransferOutcome::Success { payload, .. } => {
            let receipt = UploadReceipt::parse(url.as_str(), &payload)
                .context("Upload finished but the receipt was unreadable")?;
            info!(uploaded = receipt.count(), "Upload complete");
            Ok(ExitCode::SUCCESS)
        }
        TransferOutcome::Cancelled => {
            warn!("Upload cancelled");
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        TransferOutcome::Failed(error) => Err(error).context("Upload failed"),
    }
}
