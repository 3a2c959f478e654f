//! File transfer chunks.

use bitstream::BitReader;
use tracing::{debug, info, warn};
use wire::LimitKind;

use crate::connection::ClientConnection;
use crate::error::{ClientError, ClientResult};
use crate::host::Host;

/// A transfer the client has asked the server for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadState {
    /// Final name of the file.
    pub local_name: String,
    /// Name written to while the transfer is in progress.
    pub temp_name: String,
    /// Next block expected from the server.
    pub block: i32,
    /// Total size announced with block 0, if seen.
    pub size: Option<i32>,
    /// Bytes written so far.
    pub count: usize,
    opened: bool,
}

impl DownloadState {
    fn new(local_name: String, temp_name: String) -> Self {
        Self {
            local_name,
            temp_name,
            block: 0,
            size: None,
            count: 0,
            opened: false,
        }
    }
}

impl ClientConnection {
    /// Expects chunks for `local_name`, written through `temp_name`.
    ///
    /// Sending the request itself is up to the caller.
    pub fn begin_download(&mut self, local_name: impl Into<String>, temp_name: impl Into<String>) {
        self.download = Some(DownloadState::new(local_name.into(), temp_name.into()));
    }

    /// The transfer in progress, if any.
    #[must_use]
    pub const fn download(&self) -> Option<&DownloadState> {
        self.download.as_ref()
    }

    pub(crate) fn parse_download<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        reader: &mut BitReader<'_>,
    ) -> ClientResult<()> {
        let block = i32::from(reader.read_i16()?);
        let mut announced = None;
        if block == 0 {
            let size = reader.read_i32()?;
            if size < 0 {
                // A refusal carries its reason in place of the chunk.
                let reason = reader.read_string(self.config.wire.max_string_chars)?;
                if self.download.is_none() {
                    warn!(%reason, "server refused a download that was not requested");
                    self.outgoing.push("stopdl")?;
                    return Ok(());
                }
                return Err(ClientError::DownloadRefused { reason });
            }
            announced = Some(size);
        }
        let len = wire::checked_length(
            LimitKind::DownloadChunk,
            self.config.wire.max_download_chunk,
            i32::from(reader.read_i16()?),
        )?;
        let chunk = reader.read_bytes(len)?;

        let Some(download) = self.download.as_mut() else {
            warn!("server sending download, but no download was requested");
            self.outgoing.push("stopdl")?;
            return Ok(());
        };
        if announced.is_some() {
            download.size = announced;
        }
        if download.block != block {
            debug!(expected = download.block, got = block, "unexpected download block");
            return Ok(());
        }

        let mut result = Ok(());
        if !download.opened {
            result = host.open(&download.temp_name);
            download.opened = result.is_ok();
        }
        if result.is_ok() && !chunk.is_empty() {
            result = host.write(&chunk);
        }
        if let Err(err) = result {
            warn!(file = %download.temp_name, %err, "could not write download");
            self.download = None;
            self.outgoing.push("stopdl")?;
            return Ok(());
        }

        self.outgoing.push(format!("nextdl {}", download.block))?;
        download.block += 1;
        download.count += len;

        if chunk.is_empty() {
            host.finish(&download.temp_name, &download.local_name);
            info!(file = %download.local_name, bytes = download.count, "download complete");
            self.download = None;
        }
        Ok(())
    }
}
