use clap::Parser;
use crossbeam::channel::{self, Receiver};
use hostsyncrs::{
    cli::{load_settings, Args},
    config::Settings,
    logging,
    ui::CycleMonitor,
    ChannelSink, Diagnostic, DiagnosticSink, HostReport, SimulatedHost,
};
use simplelog::LevelFilter;
use std::thread::{self, JoinHandle};

fn main() {
    let args = parse_command_line_arguments();
    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => exit_with_error(&format!("Error loading settings: {}", e)),
    };

    initialize_logging(&args);

    let (tx, rx) = channel::bounded(settings.channel_capacity);
    let sink = ChannelSink::new(tx);
    let dropped = sink.dropped_counter();
    let printer = spawn_printer(rx, args.quiet);

    let report = run_session(settings, Box::new(sink), args.progress);

    // the host owned the sender, so the printer drains and exits here
    if printer.join().is_err() {
        log::error!("Diagnostic printer panicked");
    }

    println!("{}", report);
    let lost = dropped.load(std::sync::atomic::Ordering::Relaxed);
    if lost > 0 {
        println!("  dropped diagnostics: {}", lost);
    }
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn initialize_logging(args: &Args) {
    let term_level = args.verbose.then_some(LevelFilter::Info);
    match logging::init_logger(term_level) {
        Ok(()) => log::info!("Application starting"),
        Err(e) => eprintln!("Logging disabled: {}", e),
    }
}

fn spawn_printer(rx: Receiver<Diagnostic>, quiet: bool) -> JoinHandle<()> {
    thread::spawn(move || {
        for diagnostic in rx {
            if !quiet {
                println!("{}", diagnostic);
            }
        }
    })
}

fn run_session(settings: Settings, sink: Box<dyn DiagnosticSink>, progress: bool) -> HostReport {
    let total = u64::from(settings.cycles);
    let mut host = match SimulatedHost::new(settings, Some(sink)) {
        Ok(host) => host,
        Err(e) => exit_with_error(&e.to_string()),
    };

    if progress {
        let monitor = CycleMonitor::new(total);
        host.run_with(|h| monitor.update(h));
        monitor.finish();
    } else {
        host.run_with(|_| {});
    }

    host.into_report()
}

fn exit_with_error(message: &str) -> ! {
    log::error!("{}", message);
    eprintln!("{}", message);
    std::process::exit(1);
}
