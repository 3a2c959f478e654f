//! Full resync: the gamestate message and the settings it carries.

use bitstream::BitReader;
use tracing::{debug, info, warn};
use wire::{ServerOp, CS_SERVERINFO, CS_SYSTEMINFO, ENTITY_NUM_BITS};

use crate::connection::{ClientConnection, ConnectionState};
use crate::delta::read_entity_delta;
use crate::entity::EntityState;
use crate::error::{ClientError, ClientResult, OpContext};
use crate::host::Host;
use crate::info::{info_int, info_pairs, info_value};

/// Values the client takes from the system info configstring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SystemInfo {
    /// Identifies the server instance; echoed back in client packets.
    pub server_id: i32,
    /// The server relays opus voice.
    pub voice_enabled: bool,
    pub cheats_allowed: bool,
}

impl SystemInfo {
    /// Reads the fields the client itself uses from `info`.
    #[must_use]
    pub fn parse(info: &str) -> Self {
        Self {
            server_id: info_int(info, "sv_serverid"),
            voice_enabled: info_value(info, "sv_voipProtocol").eq_ignore_ascii_case("opus"),
            cheats_allowed: info_int(info, "cheats") != 0,
        }
    }
}

/// Values the client takes from the server info configstring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ServerInfo {
    /// Download flags advertised by the server.
    pub allow_download: i32,
    /// Base URL for out-of-band downloads, if any.
    pub download_url: String,
    pub map_name: String,
}

impl ServerInfo {
    #[must_use]
    pub fn parse(info: &str) -> Self {
        Self {
            allow_download: info_int(info, "sv_allowDownload"),
            download_url: info_value(info, "sv_dlURL").to_owned(),
            map_name: info_value(info, "mapname").to_owned(),
        }
    }
}

/// Setting whose value names a directory on the local filesystem.
const GAME_DIR_KEY: &str = "fs_game";

fn has_dir_traversal(value: &str) -> bool {
    value.contains("../") || value.contains("..\\")
}

/// Offers every pair of the system info to the settings collaborator.
///
/// Only keys the host marks as server-settable are applied. A server that
/// does not name a game directory resets the local one.
pub fn apply_system_settings<H: Host + ?Sized>(host: &mut H, info: &str) {
    host.set_pure_paks(info_value(info, "sv_paks"), info_value(info, "sv_pakNames"));
    host.set_referenced_paks(
        info_value(info, "sv_referencedPaks"),
        info_value(info, "sv_referencedPakNames"),
    );

    let mut game_dir_set = false;
    for (key, value) in info_pairs(info) {
        if key.eq_ignore_ascii_case(GAME_DIR_KEY) {
            if has_dir_traversal(value) {
                warn!(value, "server sent invalid game directory");
                continue;
            }
            game_dir_set = true;
        }
        if host.is_server_settable(key) {
            host.apply(key, value);
        } else {
            warn!(key, value, "server is not allowed to set setting");
        }
    }

    if !game_dir_set && host.value(GAME_DIR_KEY).is_some_and(|value| !value.is_empty()) {
        host.apply(GAME_DIR_KEY, "");
    }
}

impl ClientConnection {
    pub(crate) fn parse_gamestate<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        reader: &mut BitReader<'_>,
    ) -> ClientResult<()> {
        self.clear_world();
        let command_sequence = reader.read_i32()?;
        self.commands.reset(command_sequence);

        loop {
            let op = ServerOp::parse(reader.read_u8()?)?;
            match op {
                ServerOp::Eof => break,
                ServerOp::Configstring => {
                    let raw = reader.read_i16()?;
                    let max = self.configstrings.len();
                    let index = usize::try_from(raw)
                        .ok()
                        .filter(|&index| index < max)
                        .ok_or(ClientError::ConfigstringIndex {
                            index: i32::from(raw),
                            max,
                        })?;
                    let value = reader.read_string(self.config.wire.max_big_string_chars)?;
                    self.configstrings.set(index, &value)?;
                }
                ServerOp::Baseline => {
                    let number = reader.read_bits(ENTITY_NUM_BITS)? as u16;
                    let layout = &self.config.schema.entity;
                    let null = EntityState::null(layout, number);
                    let state = read_entity_delta(reader, layout, &null, number)?;
                    self.baselines.set(number, state)?;
                }
                other => {
                    return Err(ClientError::UnexpectedOpcode {
                        op: other,
                        context: OpContext::Gamestate,
                    });
                }
            }
        }

        self.client_num = reader.read_i32()?;
        self.checksum_feed = reader.read_i32()?;
        self.server_frame_time = reader.read_f32()?;

        let system_info = self.configstrings.get(CS_SYSTEMINFO);
        self.system_info = SystemInfo::parse(system_info);
        apply_system_settings(host, system_info);
        self.server_info = ServerInfo::parse(self.configstrings.get(CS_SERVERINFO));
        debug!(
            server_id = self.system_info.server_id,
            voice = self.system_info.voice_enabled,
            "system info"
        );

        host.restart(self.checksum_feed);
        host.reset(&self.server_info.map_name);
        self.state = ConnectionState::Loading;
        info!(
            map = %self.server_info.map_name,
            client_num = self.client_num,
            command_sequence,
            configstrings = self.configstrings.iter().count(),
            "gamestate received"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Filesystem, GameMessages, Settings, Transfers, Ui, Voice};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct RecordingSettings {
        allowed: Vec<&'static str>,
        values: BTreeMap<String, String>,
        paks: Option<(String, String)>,
    }

    impl Filesystem for RecordingSettings {
        fn set_pure_paks(&mut self, checksums: &str, names: &str) {
            self.paks = Some((checksums.to_owned(), names.to_owned()));
        }
    }
    impl Ui for RecordingSettings {}
    impl Transfers for RecordingSettings {}
    impl Voice for RecordingSettings {}
    impl GameMessages for RecordingSettings {}

    impl Settings for RecordingSettings {
        fn is_server_settable(&self, key: &str) -> bool {
            self.allowed.iter().any(|allowed| *allowed == key)
        }

        fn value(&self, key: &str) -> Option<String> {
            self.values.get(key).cloned()
        }

        fn apply(&mut self, key: &str, value: &str) {
            self.values.insert(key.to_owned(), value.to_owned());
        }
    }

    #[test]
    fn system_info_fields() {
        let info = SystemInfo::parse(r"\sv_serverid\77\sv_voipProtocol\OPUS\cheats\1");
        assert_eq!(
            info,
            SystemInfo {
                server_id: 77,
                voice_enabled: true,
                cheats_allowed: true,
            }
        );
        assert!(!SystemInfo::parse(r"\sv_voipProtocol\speex").voice_enabled);
        assert!(!SystemInfo::parse(r"\sv_cheats\1").cheats_allowed);
    }

    #[test]
    fn server_info_fields() {
        let info = ServerInfo::parse(r"\mapname\q3dm17\sv_allowDownload\5\sv_dlURL\http://maps");
        assert_eq!(info.map_name, "q3dm17");
        assert_eq!(info.allow_download, 5);
        assert_eq!(info.download_url, "http://maps");
    }

    #[test]
    fn only_whitelisted_settings_apply() {
        let mut host = RecordingSettings {
            allowed: vec!["sv_fps", "fs_game"],
            ..RecordingSettings::default()
        };
        apply_system_settings(
            &mut host,
            r"\sv_fps\30\cl_rconPassword\x\sv_paks\1 2\sv_pakNames\a b",
        );
        assert_eq!(host.values.get("sv_fps").map(String::as_str), Some("30"));
        assert!(!host.values.contains_key("cl_rconPassword"));
        assert_eq!(host.paks, Some(("1 2".to_owned(), "a b".to_owned())));
    }

    #[test]
    fn game_dir_traversal_is_rejected() {
        let mut host = RecordingSettings {
            allowed: vec!["fs_game"],
            ..RecordingSettings::default()
        };
        host.values.insert("fs_game".into(), "mymod".into());
        apply_system_settings(&mut host, r"\fs_game\../evil");
        // Rejected value counts as unset, so the local directory is cleared.
        assert_eq!(host.values.get("fs_game").map(String::as_str), Some(""));
    }

    #[test]
    fn game_dir_kept_when_server_sets_it() {
        let mut host = RecordingSettings {
            allowed: vec!["fs_game"],
            ..RecordingSettings::default()
        };
        apply_system_settings(&mut host, r"\fs_game\cpma");
        assert_eq!(host.values.get("fs_game").map(String::as_str), Some("cpma"));
    }
}
