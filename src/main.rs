// heapscope: terminal heap-activity tracer with live memory visualization

use std::error::Error;
use std::io;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use heapscope::provider::virtual_heap::{VirtualHeap, DEFAULT_HEAP_SIZE, VIRTUAL_HEAP_BASE};
use heapscope::trace::{EventLog, TraceAllocator};
use heapscope::ui::App;
use heapscope::workload::{spawn_producers, Workload};

struct Options {
    workload: Workload,
    threads: usize,
    heap_size: usize,
    max_events: Option<usize>,
    track_resize: bool,
}

fn usage(program: &str) {
    eprintln!("Usage: {} [workload] [options]", program);
    eprintln!();
    eprintln!("Workloads:");
    for w in Workload::all() {
        eprintln!("  {}", w.name());
    }
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --threads N       producer threads (default 4)");
    eprintln!("  --heap-size BYTES virtual heap ceiling (default {})", DEFAULT_HEAP_SIZE);
    eprintln!("  --max-events N    cap the event log (default unbounded)");
    eprintln!("  --track-resize    record successful resizes in the ledger");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut opts = Options {
        workload: Workload::Churn,
        threads: 4,
        heap_size: DEFAULT_HEAP_SIZE,
        max_events: None,
        track_resize: false,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--threads" => {
                let value = iter.next().ok_or("--threads requires a value")?;
                opts.threads = value
                    .parse()
                    .map_err(|_| format!("invalid thread count: {}", value))?;
                if opts.threads == 0 {
                    return Err("--threads must be at least 1".to_string());
                }
            }
            "--heap-size" => {
                let value = iter.next().ok_or("--heap-size requires a value")?;
                opts.heap_size = value
                    .parse()
                    .map_err(|_| format!("invalid heap size: {}", value))?;
            }
            "--max-events" => {
                let value = iter.next().ok_or("--max-events requires a value")?;
                let n = value
                    .parse()
                    .map_err(|_| format!("invalid event cap: {}", value))?;
                opts.max_events = Some(n);
            }
            "--track-resize" => opts.track_resize = true,
            name => {
                opts.workload = Workload::from_name(name)
                    .ok_or_else(|| format!("unknown workload: {}", name))?;
            }
        }
    }

    Ok(opts)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(|s| s.as_str()).unwrap_or("heapscope");

    let opts = match parse_args(args.get(1..).unwrap_or(&[])) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!();
            usage(program);
            process::exit(1);
        }
    };

    // The provider is constructed explicitly and passed to everything that
    // allocates; there is no global allocator state anywhere.
    let log = match opts.max_events {
        Some(n) => EventLog::with_max_events(n),
        None => EventLog::new(),
    };
    let tracer = Arc::new(
        TraceAllocator::with_log(VirtualHeap::new(opts.heap_size), log)
            .track_resize(opts.track_resize),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let producers = spawn_producers(
        Arc::clone(&tracer),
        opts.workload,
        opts.threads,
        Arc::clone(&stop),
    );

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the consumer loop
    let mut app = App::new(Arc::clone(&tracer), VIRTUAL_HEAP_BASE);
    let res = app.run(&mut terminal);

    // Restore terminal before reporting anything
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Wind the producers down
    stop.store(true, Ordering::Relaxed);
    for handle in producers {
        let _ = handle.join();
    }

    if let Err(err) = &res {
        eprintln!("Error: {:?}", err);
    }

    eprintln!(
        "Recorded {} events ({} dropped)",
        tracer.event_count(),
        tracer.dropped_events()
    );

    res.map_err(Into::into)
}
