use std::path::Path;
use std::process::Command;
use std::{env, fs};

const MODEL_BASE_URL: &str = "https://github.com/zibo-chen/rust-paddle-ocr/raw/next/models";

const MODELS: &[&str] = &[
    "PP-OCRv5_mobile_det.mnn",
    "latin_PP-OCRv5_mobile_rec_infer.mnn",
    "ppocr_keys_latin.txt",
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OCR_SKIP_MODEL_DOWNLOAD");

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let models_dir = Path::new(&manifest_dir).join("models");
    println!("cargo:rustc-env=OCR_DEFAULT_MODEL_DIR={}", models_dir.display());

    if env::var_os("CARGO_FEATURE_PADDLE").is_none()
        || env::var_os("OCR_SKIP_MODEL_DOWNLOAD").is_some()
    {
        return;
    }

    let all_present = MODELS
        .iter()
        .all(|name| models_dir.join(name).exists());

    if all_present {
        return;
    }

    if let Err(e) = fs::create_dir_all(&models_dir) {
        println!("cargo:warning=Failed to create models directory: {e}");
        return;
    }

    for name in MODELS {
        let dest = models_dir.join(name);
        if dest.exists() {
            continue;
        }
        println!("cargo:warning=Downloading OCR model: {name}");
        let status = Command::new("curl")
            .args(["-fsSL", "--connect-timeout", "10", "-o"])
            .arg(&dest)
            .arg(format!("{MODEL_BASE_URL}/{name}"))
            .status();
        match status {
            Ok(status) if status.success() => {}
            Ok(_) => {
                println!("cargo:warning=Failed to download {name}, the OCR engine will not start");
                let _ = fs::remove_file(&dest);
            }
            Err(e) => {
                println!("cargo:warning=Failed to run curl ({e}), skipping model download");
                return;
            }
        }
    }
}
