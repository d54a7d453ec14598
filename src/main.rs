//! LogicNav console - Main Entry Point
//!
//! Drives the navigation engine from line commands on stdin, which is handy
//! for scripting navigation scenarios and for poking at the engine without
//! a viewer attached.

use anyhow::{bail, Context};
use logicnav::{
    annotation::{AnnotationValue, DecoderFeed},
    config::config_path,
    CaptureInfo, NavAction, NavigationController, NavigationListener, NavigatorConfig, ViewState,
};
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const HELP: &str = "\
commands:
  load <samples> [rate]        load a capture (rate in Hz, default 1000000)
  width <px>                   set the viewport width
  zoom in|out|default|fit      change the zoom level
  region <start> <end>         zoom to a sample region
  cursor <i> <ts>              place cursor i
  uncursor <i>                 remove cursor i
  goto <i>                     go to cursor i
  scroll <ts>                  center the view on a timestamp
  decode <channel> <period>    run a demo decoder producing one byte every <period> samples
  annotations <channel>        list annotations in view
  view                         print the view state
  cursors                      list placed cursors
  actions                      list actions and whether they are enabled
  quit";

/// Prints view and cursor changes as they happen
struct ConsoleListener;

impl NavigationListener for ConsoleListener {
    fn view_changed(&mut self, view: &ViewState) {
        println!("  view -> {} at {:.4} px/sample", view.visible, view.scale);
    }

    fn cursor_changed(&mut self, index: usize, timestamp: Option<i64>) {
        match timestamp {
            Some(ts) => println!("  cursor {} -> {}", index, ts),
            None => println!("  cursor {} removed", index),
        }
    }
}

fn arg<T: FromStr>(args: &[&str], index: usize, name: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = args
        .get(index)
        .with_context(|| format!("missing argument <{}>", name))?;
    raw.parse()
        .with_context(|| format!("invalid <{}>: {:?}", name, raw))
}

struct Console {
    nav: NavigationController<AnnotationValue>,
    feed: DecoderFeed<AnnotationValue>,
}

impl Console {
    fn new(config: NavigatorConfig) -> Self {
        let mut nav = NavigationController::new(config);
        nav.add_listener(Box::new(ConsoleListener));
        let feed = DecoderFeed::new(nav.annotations().clone());
        Self { nav, feed }
    }

    fn print_view(&self) {
        let view = self.nav.view_state();
        let zoom = self.nav.zoom();
        println!(
            "visible {} | scale {:.4} px/sample ({:.1}%) | bounds [{:.6}, {}] | width {} px",
            view.visible,
            view.scale,
            zoom.zoom_percent(),
            zoom.min_scale(),
            zoom.max_scale(),
            view.viewport_width
        );
        if let Some(capture) = self.nav.capture() {
            println!(
                "time {} .. {}",
                capture.format_timestamp(view.visible.start),
                capture.format_timestamp(view.visible.end)
            );
        }
    }

    fn print_cursors(&self) {
        let mut any = false;
        for cursor in self.nav.defined_cursors() {
            any = true;
            let ts = cursor.timestamp().unwrap_or_default();
            let time = self
                .nav
                .capture()
                .map(|c| c.format_timestamp(ts))
                .unwrap_or_default();
            println!("{:>2}: {} at {} ({})", cursor.index(), cursor.display_label(), ts, time);
        }
        if !any {
            println!("no cursors placed");
        }
    }

    fn run_demo_decoder(&mut self, channel: usize, period: i64) -> anyhow::Result<()> {
        if period <= 0 {
            bail!("period must be positive");
        }
        let capture = *self.nav.capture().context("no capture loaded")?;
        let sender = self.feed.sender();
        let worker = std::thread::spawn(move || {
            sender.start();
            let mut start = 0i64;
            let mut byte = 0u64;
            while start + period <= capture.sample_count as i64 {
                sender.annotate(channel, AnnotationValue::Data(byte & 0xFF), start, start + period - 1);
                start += period;
                byte += 1;
            }
            sender.finish();
        });
        if worker.join().is_err() {
            bail!("decoder worker panicked");
        }
        self.feed.pump()?;
        println!(
            "decoded {} annotations on channel {}",
            self.nav.annotations().len(channel)?,
            channel
        );
        Ok(())
    }

    fn execute(&mut self, line: &str) -> anyhow::Result<bool> {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, _)) = args.split_first() else {
            return Ok(true);
        };

        match command {
            "load" => {
                let samples: u64 = arg(&args, 1, "samples")?;
                let rate: u32 = match args.get(2) {
                    Some(_) => arg(&args, 2, "rate")?,
                    None => 1_000_000,
                };
                self.nav.load_capture(CaptureInfo::new(samples, rate));
                self.print_view();
            }
            "width" => self.nav.set_viewport_width(arg(&args, 1, "px")?),
            "zoom" => {
                let action = match args.get(1).copied() {
                    Some("in") => NavAction::ZoomIn,
                    Some("out") => NavAction::ZoomOut,
                    Some("default") => NavAction::ZoomDefault,
                    Some("fit") => NavAction::ZoomAll,
                    other => bail!("unknown zoom mode {:?}", other.unwrap_or("")),
                };
                if !self.nav.perform(action)? {
                    println!("no change");
                }
            }
            "region" => {
                self.nav
                    .zoom_to_region(arg(&args, 1, "start")?, arg(&args, 2, "end")?)?;
            }
            "cursor" => self.nav.set_cursor(arg(&args, 1, "i")?, arg(&args, 2, "ts")?)?,
            "uncursor" => {
                if !self.nav.clear_cursor(arg(&args, 1, "i")?)? {
                    println!("cursor was not placed");
                }
            }
            "goto" => {
                let action = NavAction::goto_cursor(arg(&args, 1, "i")?)?;
                if !self.nav.perform(action)? {
                    println!("cursor not placed");
                }
            }
            "scroll" => {
                if !self.nav.scroll_to_timestamp(arg(&args, 1, "ts")?) {
                    println!("view unchanged");
                }
            }
            "decode" => self.run_demo_decoder(arg(&args, 1, "channel")?, arg(&args, 2, "period")?)?,
            "annotations" => {
                let range = self.nav.annotations_in_view(arg(&args, 1, "channel")?)?;
                if range.is_empty() {
                    println!("no annotations in {}", range.query());
                }
                for annotation in &range {
                    println!("{}", annotation);
                }
            }
            "view" => self.print_view(),
            "cursors" => self.print_cursors(),
            "actions" => {
                for action in NavAction::all() {
                    let enabled = self.nav.is_enabled(action)?;
                    println!(
                        "{:<14} {:<18} {}{}",
                        action.id()?,
                        action.name(),
                        action.description(),
                        if enabled { "" } else { " (disabled)" }
                    );
                }
            }
            "help" => println!("{}", HELP),
            "quit" | "exit" => return Ok(false),
            other => bail!("unknown command {:?} (try `help`)", other),
        }
        Ok(true)
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,logicnav=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    tracing::info!("Starting LogicNav console");
    if let Some(path) = config_path() {
        tracing::debug!("Config location: {:?}", path);
    }

    let mut console = Console::new(NavigatorConfig::load_or_default());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("> ");
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        match console.execute(line.trim()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("error: {:#}", e),
        }
        print!("> ");
        stdout.flush()?;
    }

    tracing::info!("LogicNav console exiting");
    Ok(())
}
