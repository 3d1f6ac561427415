//! Command-line shell.
//!
//! Subcommands: `crop` simulates one drag over an image file and publishes
//! the result, `consume` opens a consumer on the stored record, `clear`
//! removes the record.
//!
//! Each subcommand is its own process, so the relay's live channel has no
//! subscriber here and `crop` reports `Queued` (or `Failed` if the record
//! cannot be written). Live delivery only happens
//! when producer and consumer share a process; across processes the
//! consumer picks the payload up from the delivery record on startup.

use crate::binder::{GestureEvent, GestureStart, SurfaceBinder};
use crate::config::CropperConfig;
use crate::consumer::{ConsumerAdapter, HttpUploader};
use crate::extract::ImageSource;
use crate::geometry::{Bounds, Point};
use crate::host::headless::{HeadlessImage, HeadlessPage};
use crate::host::{ElementId, InputId};
use crate::relay::{BroadcastChannel, DeliveryRecord, FileStore, ProcessLauncher, ResultRelay};
use crate::session::SessionOutcome;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;

fn load_env() {
    for env_file in [".env.local", ".env"] {
        let path = PathBuf::from(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break;
        }
    }
}

fn command() -> Command {
    Command::new("image-cropper")
        .about("Select a region of an image, extract it and hand it to the analysis consumer")
        .subcommand_required(true)
        .subcommand(
            Command::new("crop")
                .about("Drag-select a region of an image file and publish it")
                .arg(Arg::new("image").help("Image file").required(true).index(1))
                .arg(
                    Arg::new("display")
                        .long("display")
                        .help("Displayed size WIDTHxHEIGHT (defaults to the native size)")
                        .value_name("WxH"),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Drag start in display pixels (x,y)")
                        .value_name("X,Y")
                        .required(true),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Drag end in display pixels (x,y)")
                        .value_name("X,Y")
                        .required(true),
                )
                .arg(
                    Arg::new("touch")
                        .long("touch")
                        .help("Drive the gesture with a single touch instead of the mouse")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("consume")
                .about("Open the consumer: show and upload the last extracted image")
                .arg(
                    Arg::new("width")
                        .long("width")
                        .help("Width of the consumer frame in pixels")
                        .value_name("PX")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("height")
                        .long("height")
                        .help("Height of the consumer frame in pixels")
                        .value_name("PX")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(Command::new("clear").about("Remove the stored delivery record"))
}

/// Parse `a<sep>b` into two numbers.
fn parse_pair<T: std::str::FromStr>(raw: &str, sep: char) -> Result<(T, T), String> {
    let (a, b) = raw
        .split_once(sep)
        .ok_or_else(|| format!("expected two values separated by '{}': {}", sep, raw))?;
    let a = a.trim().parse().map_err(|_| format!("invalid number: {}", a))?;
    let b = b.trim().parse().map_err(|_| format!("invalid number: {}", b))?;
    Ok((a, b))
}

/// Header line of the consumer output, sized like the window that asked for it.
fn frame_title(width: u32, height: u32) -> String {
    format!("== Image Cropper consumer ({}x{}) ==", width, height)
}

fn record_for(config: &CropperConfig) -> DeliveryRecord {
    DeliveryRecord::new(Arc::new(FileStore::new(&config.store_dir)))
}

fn crop(config: &CropperConfig, args: &ArgMatches) -> Result<(), String> {
    let path = PathBuf::from(args.get_one::<String>("image").ok_or("missing image")?);
    let (from_x, from_y): (f64, f64) = parse_pair(args.get_one::<String>("from").ok_or("missing --from")?, ',')?;
    let (to_x, to_y): (f64, f64) = parse_pair(args.get_one::<String>("to").ok_or("missing --to")?, ',')?;

    let source = ImageSource::open(&path).map_err(|e| e.to_string())?;
    let (native_w, native_h) = crate::extract::PixelSource::native_size(&source);
    let (display_w, display_h): (f64, f64) = match args.get_one::<String>("display") {
        Some(raw) => parse_pair(raw, 'x')?,
        None => (native_w as f64, native_h as f64),
    };

    let page = Arc::new(HeadlessPage::new());
    page.insert(HeadlessImage::new(
        "image",
        source,
        Bounds::new(0.0, 0.0, display_w, display_h),
    ));

    let relay = ResultRelay::new(
        record_for(config),
        Arc::new(BroadcastChannel::default()),
        Arc::new(ProcessLauncher::new(config.panel_command.clone())),
    )
    .with_window(config.window);
    let binder = SurfaceBinder::new(page.clone(), Arc::new(relay));
    binder.bind(&ElementId::root());

    let element = ElementId::new("image");
    let from = Point::new(from_x, from_y);
    let to = Point::new(to_x, to_y);
    let (start, input) = if args.get_flag("touch") {
        (GestureStart::touch(element, 0, from), InputId::Touch(0))
    } else {
        (GestureStart::mouse(element, from), InputId::Mouse)
    };

    binder.gesture_start(start);
    binder.window_event(GestureEvent::Move { input, point: to });
    let dispatch = binder.window_event(GestureEvent::End { input, point: to });

    match dispatch.outcome {
        Some(SessionOutcome::Committed(outcome)) => {
            println!("Extracted region, delivery: {:?}", outcome);
            Ok(())
        }
        Some(SessionOutcome::Discarded) => {
            println!("Empty selection, nothing extracted");
            Ok(())
        }
        Some(SessionOutcome::Failed(e)) => {
            println!("No image produced: {}", e);
            Ok(())
        }
        None => Err("gesture did not start a selection".to_string()),
    }
}

fn consume(config: &CropperConfig, args: &ArgMatches) -> Result<(), String> {
    let width = args.get_one::<u32>("width").copied().unwrap_or(config.window.width);
    let height = args.get_one::<u32>("height").copied().unwrap_or(config.window.height);
    println!("{}", frame_title(width, height));

    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    let uploader = HttpUploader::new(config.endpoint.clone(), config.upload_field.clone());
    let mut consumer = ConsumerAdapter::new(record_for(config), uploader);

    if !runtime.block_on(consumer.start()) {
        println!("No cropped image yet. Drag on an image to select a region.");
        return Ok(());
    }

    let view = consumer.view();
    if let Some(preview) = &view.preview {
        println!("Preview: {} bytes of data URL", preview.len());
    }
    println!("{}", view.status);
    if let Some(result) = &view.result {
        println!("{}", result);
    }
    Ok(())
}

fn clear(config: &CropperConfig) -> Result<(), String> {
    record_for(config).clear().map_err(|e| e.to_string())?;
    println!("Cleared");
    Ok(())
}

/// Entry point for the binary. Returns the process exit code.
pub fn run() -> i32 {
    load_env();
    env_logger::init();

    let matches = command().get_matches();
    let config = CropperConfig::load();
    log::debug!("[STARTUP] Config: {:?}", config);

    let result = match matches.subcommand() {
        Some(("crop", args)) => crop(&config, args),
        Some(("consume", args)) => consume(&config, args),
        Some(("clear", _)) => clear(&config),
        _ => Err("unknown command".to_string()),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            1
        }
    }
}
