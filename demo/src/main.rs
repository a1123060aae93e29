use std::error::Error;

use demo::image::ImageDisk;
use demo::{FILE_NAME, write_hello};
use drivers::{DiskIo, Drive};
use log::{error, info};

/// Raw image standing in for the memory card.
const IMAGE_PATH: &str = "sdcard.img";

fn run() -> Result<(), Box<dyn Error>> {
    let card = ImageDisk::open(IMAGE_PATH)?;
    write_hello(DiskIo::new(Drive::MemoryCard, card))?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => info!("{} written to {}", FILE_NAME, IMAGE_PATH),
        Err(e) => error!("demo failed: {}", e),
    }

    // Halt.
    loop {
        std::thread::park();
    }
}
