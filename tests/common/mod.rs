#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// A valid sidecar with one box and one custom annotation.
pub const VALID_SIDECAR: &str = r#"{
  "type": "image",
  "meta": {
    "version": 1,
    "tool": "annota",
    "tool_version": "0.1.0",
    "created_at": "2024-05-01T12:00:00+00:00",
    "updated_at": "2024-05-01T12:00:00+00:00"
  },
  "file": {
    "width": 1280,
    "height": 720
  },
  "annotations": [
    {
      "uuid": "0b5e6c1e-2f0a-4d7c-9a53-4c1b8f1e2a10",
      "name": "start_button",
      "display_name": "Start",
      "description": "Main menu start button",
      "attributes": {
        "type": "box",
        "geometry": {"x": 100, "y": 200, "width": 300, "height": 80}
      },
      "extra": {"z_order": 3, "hint": "primary"}
    },
    {
      "uuid": "7d0f3a52-8f43-4a8e-8d2e-1f6b0c9a4e77",
      "name": "panel",
      "display_name": "Panel",
      "description": null,
      "attributes": {"type": "nine_patch", "insets": {"left": 4, "right": 4}, "tags": ["ui", null]},
      "extra": null
    }
  ]
}
"#;

pub fn write_sidecar(dir: &Path, file_name: &str, text: &str) -> PathBuf {
    fs::create_dir_all(dir).expect("create sidecar dir");
    let path = dir.join(file_name);
    fs::write(&path, text).expect("write sidecar");
    path
}

/// A minimal 24-bit BMP of the given size.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}
