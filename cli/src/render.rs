//! Plain-text rendering of command output.
//!
//! Results go to stdout, warnings to stderr, no colors. Output stays
//! greppable so the CLI composes with shell pipelines.

use redink_types::{Analysis, AnalysisStatus, Writing, WritingPage};

pub fn warn(message: &str) {
    eprintln!("warning: {message}");
}

pub fn print_writing_list(page: &WritingPage) {
    if page.writings.is_empty() {
        println!("No writings yet. Create one with `redink new`.");
        return;
    }
    for writing in &page.writings {
        println!(
            "{}  {:<12}  {:<9}  {}",
            writing.id,
            writing.kind.display_name(),
            writing.status,
            writing.title
        );
    }
    println!();
    println!(
        "page {} of {} ({} total)",
        page.page, page.total_pages, page.total
    );
}

pub fn print_writing(writing: &Writing) {
    println!("{}", writing.title);
    println!("id:        {}", writing.id);
    println!("type:      {}", writing.kind.display_name());
    println!("status:    {}", writing.status);
    println!(
        "updated:   {}",
        writing.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(submitted_at) = writing.submitted_at {
        println!("submitted: {}", submitted_at.format("%Y-%m-%d %H:%M UTC"));
    }
    println!();
    println!("{}", writing.content);
}

pub fn print_status(status: AnalysisStatus) {
    println!("Analysis is {status}.");
}

pub fn print_analysis(analysis: &Analysis) {
    match analysis.status {
        AnalysisStatus::Completed => {
            match analysis.ai_score {
                Some(score) => println!("Score: {score:.1} / 100"),
                None => println!("Score: not reported"),
            }
            if let Some(feedback) = analysis.feedback.as_deref() {
                println!();
                println!("{feedback}");
            }
            if let Some(latency) = analysis.latency_ms {
                println!();
                println!("(scored in {latency} ms)");
            }
        }
        AnalysisStatus::Failed => warn(&analysis.failure_message()),
        status => print_status(status),
    }
}
