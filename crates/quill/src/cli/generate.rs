//! Prompt and generation command handlers.

use super::context::load_context;
use futures::future::AbortHandle;
use quill::{
    GenerationSession, IdeaSelection, IdeaStrategy, QuillResult, RepeatOptions, SessionOutcome,
    Settings, Target,
};
use std::io::Write;
use std::path::Path;

/// Print the prompt a generation would send, without contacting the server.
pub fn print_prompt(
    settings: Settings,
    context_path: &Path,
    idea: Option<IdeaSelection>,
    fast: bool,
) -> QuillResult<()> {
    let context = load_context(context_path)?;
    let session = GenerationSession::from_settings(settings);

    let target = match idea {
        Some(selection) => Target::Idea {
            selection,
            strategy: if fast {
                IdeaStrategy::Fast
            } else {
                IdeaStrategy::Safe
            },
        },
        None => Target::Generate,
    };
    let prepared = session.prepare(&context, target);

    println!("{}", prepared.request().prompt());
    eprintln!("task: {}", prepared.task());
    if let Some(stop) = prepared.request().stop_sequence() {
        eprintln!("stop sequence: {:?}", stop);
    }
    if let Some(warning) = prepared.warning() {
        eprintln!("{}", warning);
    }
    Ok(())
}

/// Stream one generation (or a repeated series) to stdout.
///
/// Ctrl-C cancels the running generation. Prerequisite warnings are logged
/// by the session.
pub async fn run_generation(
    settings: Settings,
    context_path: &Path,
    target: Target,
    repeat: Option<usize>,
) -> QuillResult<()> {
    let context = load_context(context_path)?;
    let mut session = GenerationSession::from_settings(settings);

    let (handle, registration) = AbortHandle::new_pair();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, stopping generation");
            handle.abort();
        }
    });

    let mut stdout = std::io::stdout();
    let mut sink = |token: &str| {
        print!("{}", token);
        let _ = stdout.flush();
    };

    let result = match repeat {
        None => {
            let prepared = session.prepare(&context, target);
            session
                .run(&prepared, &mut sink, registration)
                .await
                .map(|report| vec![report.into_outcome()])
        }
        Some(cycles) => {
            let options = RepeatOptions {
                cycles: (cycles > 0).then_some(cycles),
                ..RepeatOptions::default()
            };
            session
                .run_repeated(&context, target, options, &mut sink, registration)
                .await
                .map(|report| report.outcomes().clone())
        }
    };
    ctrl_c.abort();
    println!();

    for outcome in result? {
        if let SessionOutcome::ExtractionFailed { raw } = outcome {
            eprintln!("選択した項目が出力に見つかりませんでした。");
            tracing::debug!(raw_len = raw.len(), "Unfiltered response discarded");
        }
    }
    Ok(())
}
