use anyhow::Result;

use storyreel::{AssemblyPipeline, CueConfig, PipelineConfig, StoryStore};

pub async fn cmd_build(
    store_root: &str,
    story_id: &str,
    language: &str,
    max_words: usize,
    max_gap: f64,
    keep_scratch: bool,
) -> Result<()> {
    eprintln!("🎬 Building story: {story_id}");
    eprintln!("   Store: {store_root}");

    let config = PipelineConfig::default()
        .with_subtitle_language(language)
        .with_keep_scratch(keep_scratch)
        .with_cue_config(
            CueConfig::default()
                .with_max_words(max_words)
                .with_max_gap_seconds(max_gap),
        );

    let pipeline = AssemblyPipeline::new(config)?;
    let store = StoryStore::new(store_root);

    let start = std::time::Instant::now();
    match pipeline.build(&store, story_id).await {
        Ok(report) => {
            eprintln!("\n✅ Build complete in {:.1}s", start.elapsed().as_secs_f64());
            eprintln!("   Output: {}", report.final_video.display());
            eprintln!(
                "   Captions: {}",
                if report.subtitles_applied {
                    "embedded"
                } else {
                    "none"
                }
            );
            // The artifact path is the machine-readable result.
            println!("{}", report.final_video.display());
            Ok(())
        }
        Err(e) if e.is_precondition() => {
            eprintln!("\n❌ Cannot build: {e}");
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("\n❌ Build failed while {}: {e}", e.stage());
            std::process::exit(1);
        }
    }
}
