use anyhow::Result;

use storyreel::{AssemblyPipeline, PipelineConfig};

pub async fn cmd_doctor() -> Result<()> {
    let pipeline = AssemblyPipeline::new(PipelineConfig::default())?;

    let mut all_ok = true;
    for (tool, available) in pipeline.check_dependencies().await {
        let mark = if available { "✅" } else { "❌" };
        eprintln!("{mark} {tool}");
        all_ok &= available;
    }

    if !all_ok {
        eprintln!("\nInstall ffmpeg (which provides ffprobe) and ensure it is in PATH");
        std::process::exit(1);
    }
    Ok(())
}
