//! Render a few HTML documents to PDF files.
//!
//! Run with:
//!
//! ```sh
//! RENDER_POOL_SIZE=3 cargo run --example html_to_file
//! ```
//!
//! Press Ctrl+C at any time: accepted documents finish, Chrome is closed,
//! and the process exits.

use html2pdf_pool::prelude::*;
use std::thread;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting html_to_file demo...");

    let pool = init_worker_pool()?;
    ShutdownCoordinator::new(pool.clone()).install()?;

    let documents = [
        ("invoice.pdf", "<h1>Invoice #1001</h1><p>Total: 42.00</p>"),
        ("report.pdf", "<h1>Quarterly Report</h1><p>All systems nominal.</p>"),
        ("letter.pdf", "<h1>Dear reader,</h1><p>Thanks for trying the pool.</p>"),
    ];

    let renders: Vec<_> = documents
        .into_iter()
        .map(|(file, html)| {
            let pool = pool.clone();
            thread::spawn(move || (file, pool.submit(html)))
        })
        .collect();

    for render in renders {
        let (file, result) = render.join().map_err(|_| "render thread panicked")?;
        match result {
            Ok(pdf) => {
                std::fs::write(file, &pdf)?;
                log::info!("✅ Wrote {} ({} bytes)", file, pdf.len());
            }
            Err(e) => log::error!("❌ Failed to render {}: {}", file, e),
        }
    }

    let stats = pool.stats();
    log::info!(
        "Completed: {}, failed: {}",
        stats.completed,
        stats.failed
    );

    match pool.shutdown() {
        Ok(()) | Err(RenderPoolError::AlreadyClosed) => {}
        Err(e) => return Err(e.into()),
    }
    pool.await_termination();

    Ok(())
}
