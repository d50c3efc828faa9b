use workpass_ai::answer::{render_sources, Answer};
use workpass_ai::engine::{EngineStatus, SearchHit};
use workpass_ai::pipeline::BuildReport;

use crate::OutputFormat;

fn json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn answer(answer: &Answer, format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        return json(answer);
    }
    println!("{}", answer.answer);
    let lines = render_sources(&answer.sources);
    if !lines.is_empty() {
        println!();
        println!("Sources:");
        for line in lines {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn search_hits(hits: &[SearchHit], format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        return json(&hits);
    }
    if hits.is_empty() {
        println!("No results.");
    }
    for (i, h) in hits.iter().enumerate() {
        println!("{}. {} [{:.3}]", i + 1, h.title, h.relevance_score);
        println!("   {} | {} | {}", h.url, h.pass_type, h.category);
        let preview: String = h.text.chars().take(200).collect();
        println!("   {}", preview.replace('\n', " "));
    }
    Ok(())
}

pub fn list(items: &[String], format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        return json(&items);
    }
    for item in items {
        println!("{item}");
    }
    Ok(())
}

pub fn status(status: &EngineStatus, format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        return json(status);
    }
    let c = &status.collection;
    println!("state:       {:?}", status.state);
    println!("collection:  {}", c.name);
    println!("ready:       {}", c.ready);
    println!("chunks:      {}", c.chunk_count);
    if let Some(model) = &c.model {
        println!("model:       {model}");
    }
    if let Some(dims) = c.dims {
        println!("dims:        {dims}");
    }
    if let Some(at) = &c.updated_at {
        println!("updated_at:  {at}");
    }
    println!(
        "artifact:    {}",
        if status.artifact_found { "found" } else { "missing" }
    );
    if let Some(err) = &status.error {
        println!("error:       {err}");
    }
    Ok(())
}

pub fn build_report(report: &BuildReport, format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        return json(report);
    }
    if report.pages > 0 {
        println!(
            "pages: {} ({} skipped)",
            report.pages, report.skipped_pages
        );
    }
    println!("chunks: {}", report.chunks);
    println!(
        "indexed: {} into {} ({} embedded, {} reused, {} duplicates dropped)",
        report.index.status.chunk_count,
        report.index.status.name,
        report.index.embedded,
        report.index.reused,
        report.index.duplicates_dropped
    );
    Ok(())
}
