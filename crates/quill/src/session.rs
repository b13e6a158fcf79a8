//! Generation sessions.
//!
//! A [`GenerationSession`] owns a backend and the settings store and runs the
//! host side of a generation: it prepares the request, streams or collects the
//! response, filters safe-mode idea output, and repeats when asked to.
//!
//! Cancellation goes through [`futures::future::AbortHandle`]: create a pair
//! with [`AbortHandle::new_pair`], pass the registration to [`GenerationSession::run`],
//! and call [`AbortHandle::abort`] from anywhere (a Ctrl-C handler, a token sink).
//! Tokens already delivered to the sink stay delivered.
//!
//! [`AbortHandle::new_pair`]: futures::future::AbortHandle::new_pair
//! [`AbortHandle::abort`]: futures::future::AbortHandle::abort

use futures::StreamExt;
use futures::future::{AbortRegistration, Abortable};
use quill_core::{
    GenerationContext, GenerationStatus, IdeaSelection, IdeaStrategy, InfiniteBehavior, Mode,
    Settings, TaskType,
};
use quill_error::ServerError;
use quill_prompt::{IdeaPlan, IdeaProcessor, PromptAssembler, evaluate, evaluate_metadata_with};
use quill_server::{GenerationBackend, GenerationRequest, backend_from_settings};
use std::time::Duration;
use tracing::{Instrument, Span, debug, info, instrument, warn};

/// Receives generated text as it becomes available.
pub trait TokenSink: Send {
    /// Handle one piece of output.
    fn on_token(&mut self, token: &str);
}

impl<F: FnMut(&str) + Send> TokenSink for F {
    fn on_token(&mut self, token: &str) {
        self(token)
    }
}

/// Where a generation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum IdeaPhase {
    /// Nothing running
    #[display("idle")]
    Idle,
    /// Building the request
    #[display("preparing")]
    Preparing,
    /// Forwarding tokens as they arrive
    #[display("streaming")]
    Streaming,
    /// Collecting the whole response before filtering
    #[display("awaiting_full_response")]
    AwaitingFullResponse,
    /// Extracting the selected section
    #[display("filtering")]
    Filtering,
}

/// What to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Story text (new or continued)
    Generate,
    /// Structured idea output
    Idea {
        /// Field to produce, or all of them
        selection: IdeaSelection,
        /// Safe (filter) or fast (suffix + stream)
        strategy: IdeaStrategy,
    },
}

impl Target {
    /// Mode this target runs in.
    pub fn mode(&self) -> Mode {
        match self {
            Target::Generate => Mode::Generate,
            Target::Idea { .. } => Mode::Idea,
        }
    }

    /// User-facing task name.
    pub fn task_name(&self) -> &'static str {
        match self {
            Target::Generate => "単発生成",
            Target::Idea {
                selection,
                strategy,
            } => {
                if *selection == IdeaSelection::All || *strategy == IdeaStrategy::Fast {
                    "アイデア生成 (高速)"
                } else {
                    "アイデア生成 (安全)"
                }
            }
        }
    }

    /// Line written before output block `block`.
    pub fn separator(&self, block: u32) -> String {
        match self {
            Target::Generate => format!("\n--- 生成ブロック {} ---\n", block),
            Target::Idea { selection, .. } => {
                format!("\n--- アイデア生成 ({}) ({}) ---\n", selection, block)
            }
        }
    }

    /// Message written when a run is cancelled.
    pub fn cancelled_message(&self) -> String {
        format!("\n--- {}がキャンセルされました ---\n", self.task_name())
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Generate => write!(f, "generate"),
            Target::Idea {
                selection,
                strategy,
            } => write!(f, "idea({}, {})", selection, strategy),
        }
    }
}

/// A request ready to send, plus what to do with the response.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct Prepared {
    /// What is being generated
    target: Target,
    /// Classified task
    task: TaskType,
    /// Backend request
    request: GenerationRequest,
    /// Idea-mode plan; `None` for generate mode
    plan: Option<IdeaPlan>,
}

impl Prepared {
    /// Whether tokens go to the sink as they arrive.
    pub fn use_streaming(&self) -> bool {
        self.plan.as_ref().is_none_or(IdeaPlan::use_streaming)
    }

    /// Whether the collected response must be filtered.
    pub fn requires_filtering(&self) -> bool {
        self.plan.as_ref().is_some_and(IdeaPlan::requires_filtering)
    }

    /// Fast-mode prerequisite warning, if any.
    pub fn warning(&self) -> Option<&str> {
        self.plan
            .as_ref()
            .and_then(IdeaPlan::prerequisites)
            .and_then(|check| check.warning())
    }
}

/// How one run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Streamed output, complete
    Completed {
        /// Everything generated
        text: String,
    },
    /// Safe-mode output after extracting the selected section
    Filtered {
        /// Extracted section
        text: String,
        /// Full response before filtering
        raw: String,
    },
    /// Safe-mode response did not contain the selected section
    ExtractionFailed {
        /// Full response
        raw: String,
    },
    /// Aborted by the caller
    Cancelled {
        /// Text received before the abort
        partial: String,
        /// Phase the run was in
        phase: IdeaPhase,
    },
}

impl SessionOutcome {
    /// The text this outcome delivered (or collected, when cancelled).
    pub fn text(&self) -> &str {
        match self {
            SessionOutcome::Completed { text } | SessionOutcome::Filtered { text, .. } => text,
            SessionOutcome::ExtractionFailed { .. } => "",
            SessionOutcome::Cancelled { partial, .. } => partial,
        }
    }

    /// Whether the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionOutcome::Cancelled { .. })
    }
}

/// Result of [`GenerationSession::run`].
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct RunReport {
    /// How the run ended
    outcome: SessionOutcome,
    /// Phases entered, in order
    phases: Vec<IdeaPhase>,
}

impl RunReport {
    /// Consume and return the outcome.
    pub fn into_outcome(self) -> SessionOutcome {
        self.outcome
    }
}

/// Result of [`GenerationSession::run_repeated`].
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct RepeatReport {
    /// One outcome per cycle that started
    outcomes: Vec<SessionOutcome>,
    /// Phases entered across all cycles
    phases: Vec<IdeaPhase>,
    /// Prerequisite warning, reported once per session
    warning: Option<String>,
    /// Whether the loop ended by cancellation
    #[getter(skip)]
    cancelled: bool,
}

impl RepeatReport {
    /// Whether the loop ended by cancellation.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Cycle limit and pause for [`GenerationSession::run_repeated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatOptions {
    /// Maximum cycles; `None` runs until cancelled
    pub cycles: Option<usize>,
    /// Pause between cycles
    pub pause: Duration,
}

impl Default for RepeatOptions {
    fn default() -> Self {
        Self {
            cycles: None,
            pause: Duration::from_millis(500),
        }
    }
}

struct PhaseTracker {
    span: Span,
    phases: Vec<IdeaPhase>,
}

impl PhaseTracker {
    fn new(span: Span) -> Self {
        Self {
            span,
            phases: Vec::new(),
        }
    }

    fn enter(&mut self, phase: IdeaPhase) {
        debug!(%phase, "Entering phase");
        self.span.record("phase", tracing::field::display(phase));
        self.phases.push(phase);
    }

    fn current(&self) -> IdeaPhase {
        self.phases.last().copied().unwrap_or(IdeaPhase::Idle)
    }
}

/// Runs generations against one backend.
pub struct GenerationSession<B = Box<dyn GenerationBackend>> {
    backend: B,
    settings: Settings,
    assembler: PromptAssembler,
    block_counter: u32,
}

impl GenerationSession {
    /// Session using the backend selected by `settings`.
    pub fn from_settings(settings: Settings) -> Self {
        let backend = backend_from_settings(&settings);
        Self::new(backend, settings)
    }
}

impl<B: GenerationBackend> GenerationSession<B> {
    /// Session over an explicit backend.
    pub fn new(backend: B, settings: Settings) -> Self {
        let assembler = PromptAssembler::from(&settings);
        Self {
            backend,
            settings,
            assembler,
            block_counter: 1,
        }
    }

    /// The backend requests go to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Settings in effect.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Number shown in the next output separator.
    pub fn block_counter(&self) -> u32 {
        self.block_counter
    }

    /// Prepare a generate-mode request.
    ///
    /// Dynamic prompts in the body text are resolved here; the configured stop
    /// sequences apply.
    #[instrument(skip(self, context), fields(body_len = context.body_text().len()))]
    pub fn prepare_generate(&self, context: &GenerationContext) -> Prepared {
        let mut context = context.clone();
        context.set_mode(Mode::Generate);
        let body = evaluate(context.body_text());
        context.set_body_text(body);

        let assembled = self.assembler.assemble(&context);
        let request = GenerationRequest::new(assembled.prompt().as_str())
            .with_max_length(self.settings.max_length(&Mode::Generate));

        Prepared {
            target: Target::Generate,
            task: *assembled.task(),
            request,
            plan: None,
        }
    }

    /// Prepare an idea-mode request.
    ///
    /// The metadata is resolved once so the base prompt and the fast-mode
    /// suffix agree. The body text is left out of idea prompts.
    #[instrument(skip(self, context))]
    pub fn prepare_idea(
        &self,
        context: &GenerationContext,
        selection: IdeaSelection,
        strategy: IdeaStrategy,
    ) -> Prepared {
        let metadata = evaluate_metadata_with(context.metadata(), &mut rand::thread_rng());

        let mut context = context.clone();
        context.set_mode(Mode::Idea);
        context.set_body_text("");
        *context.metadata_mut() = metadata.clone();

        let assembled = self.assembler.assemble(&context);
        let plan = IdeaProcessor::new(&metadata).plan(selection, strategy);
        let prompt = format!("{}{}", assembled.prompt(), plan.suffix());
        let request = GenerationRequest::new(prompt)
            .with_max_length(self.settings.max_length(&Mode::Idea))
            .with_stop_sequence(plan.stop_sequence().map(<[String]>::to_vec));

        Prepared {
            target: Target::Idea {
                selection,
                strategy,
            },
            task: *assembled.task(),
            request,
            plan: Some(plan),
        }
    }

    /// Prepare whichever kind of request `target` names.
    pub fn prepare(&self, context: &GenerationContext, target: Target) -> Prepared {
        match target {
            Target::Generate => self.prepare_generate(context),
            Target::Idea {
                selection,
                strategy,
            } => self.prepare_idea(context, selection, strategy),
        }
    }

    /// Run one prepared request.
    ///
    /// The output separator goes to `sink` first. Streaming requests forward
    /// every token; safe-mode idea requests collect the response and deliver
    /// only the extracted section. Backend errors are returned as-is.
    pub async fn run<S: TokenSink + ?Sized>(
        &mut self,
        prepared: &Prepared,
        sink: &mut S,
        cancel: AbortRegistration,
    ) -> Result<RunReport, ServerError> {
        let span = tracing::info_span!(
            "generation",
            kind = %prepared.target,
            task = %prepared.task,
            status = %GenerationStatus::SingleRunning,
            phase = tracing::field::Empty,
        );
        let mut tracker = PhaseTracker::new(span.clone());
        tracker.enter(IdeaPhase::Preparing);
        if let Some(warning) = prepared.warning() {
            warn!("{}", warning);
        }

        sink.on_token(&prepared.target.separator(self.block_counter));
        let mut collected = String::new();
        let result = Abortable::new(
            self.drive(prepared, &mut *sink, &mut collected, &mut tracker),
            cancel,
        )
        .instrument(span.clone())
        .await;

        let outcome = match result {
            Err(_aborted) => {
                info!(parent: &span, "Generation cancelled");
                sink.on_token(&prepared.target.cancelled_message());
                SessionOutcome::Cancelled {
                    partial: collected,
                    phase: tracker.current(),
                }
            }
            Ok(Err(e)) => {
                tracker.enter(IdeaPhase::Idle);
                return Err(e);
            }
            Ok(Ok(())) => {
                let outcome = Self::finish(prepared, collected, &mut tracker);
                if let SessionOutcome::Filtered { text, .. } = &outcome {
                    sink.on_token(text);
                }
                self.block_counter += 1;
                outcome
            }
        };

        tracker.enter(IdeaPhase::Idle);
        Ok(RunReport {
            outcome,
            phases: tracker.phases,
        })
    }

    /// Run `target` repeatedly until the cycle limit or cancellation.
    ///
    /// With [`InfiniteBehavior::Manual`] the request is prepared once and
    /// reused; with [`InfiniteBehavior::Immediate`] it is rebuilt from
    /// `context` every cycle. Cycles never overlap. A backend error stops the
    /// loop and is returned.
    pub async fn run_repeated<S: TokenSink + ?Sized>(
        &mut self,
        context: &GenerationContext,
        target: Target,
        options: RepeatOptions,
        sink: &mut S,
        cancel: AbortRegistration,
    ) -> Result<RepeatReport, ServerError> {
        let behavior = self
            .settings
            .infinite_generation_behavior
            .for_mode(&target.mode());
        let span = tracing::info_span!(
            "generation",
            kind = %target,
            %behavior,
            status = %GenerationStatus::InfiniteRunning,
            phase = tracing::field::Empty,
        );

        let mut prepared = self.prepare(context, target);
        let warning = prepared.warning().map(str::to_string);
        if let Some(warning) = &warning {
            warn!(parent: &span, "{}", warning);
        }

        let mut tracker = PhaseTracker::new(span.clone());
        let mut outcomes = Vec::new();
        let mut partial = String::new();
        let mut block = self.block_counter;

        let cycles = async {
            let mut cycle = 0usize;
            while options.cycles.is_none_or(|max| cycle < max) {
                if cycle > 0 {
                    if options.pause.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(options.pause).await;
                    }
                    if behavior == InfiniteBehavior::Immediate {
                        prepared = self.prepare(context, target);
                    }
                }

                tracker.enter(IdeaPhase::Preparing);
                sink.on_token(&target.separator(block));
                partial.clear();
                self.drive(&prepared, &mut *sink, &mut partial, &mut tracker)
                    .await?;

                let outcome = Self::finish(&prepared, std::mem::take(&mut partial), &mut tracker);
                if let SessionOutcome::Filtered { text, .. } = &outcome {
                    sink.on_token(text);
                }
                outcomes.push(outcome);
                tracker.enter(IdeaPhase::Idle);
                block += 1;
                cycle += 1;
            }
            Ok::<(), ServerError>(())
        };

        let result = Abortable::new(cycles, cancel)
            .instrument(span.clone())
            .await;
        self.block_counter = block;

        let cancelled = match result {
            Err(_aborted) => {
                info!(parent: &span, cycles = outcomes.len(), "Repeated generation cancelled");
                sink.on_token(&target.cancelled_message());
                if tracker.current() != IdeaPhase::Idle {
                    outcomes.push(SessionOutcome::Cancelled {
                        partial,
                        phase: tracker.current(),
                    });
                    tracker.enter(IdeaPhase::Idle);
                }
                true
            }
            Ok(Err(e)) => return Err(e),
            Ok(Ok(())) => false,
        };

        Ok(RepeatReport {
            outcomes,
            phases: tracker.phases,
            warning,
            cancelled,
        })
    }

    async fn drive<S: TokenSink + ?Sized>(
        &self,
        prepared: &Prepared,
        sink: &mut S,
        collected: &mut String,
        tracker: &mut PhaseTracker,
    ) -> Result<(), ServerError> {
        let streaming = prepared.use_streaming();
        tracker.enter(if streaming {
            IdeaPhase::Streaming
        } else {
            IdeaPhase::AwaitingFullResponse
        });

        let mut stream = self.backend.generate_stream(&prepared.request).await?;
        while let Some(token) = stream.next().await {
            let token = token?;
            if streaming {
                sink.on_token(&token);
            }
            collected.push_str(&token);
        }
        debug!(
            provider = self.backend.provider_name(),
            len = collected.len(),
            "Response complete"
        );
        Ok(())
    }

    fn finish(prepared: &Prepared, raw: String, tracker: &mut PhaseTracker) -> SessionOutcome {
        let Some(plan) = prepared.plan.as_ref().filter(|plan| plan.requires_filtering()) else {
            return SessionOutcome::Completed { text: raw };
        };

        tracker.enter(IdeaPhase::Filtering);
        let text = IdeaProcessor::filter_output(&raw, plan.selection());
        if text.is_empty() {
            warn!(selection = %plan.selection(), "Selected section not found in response");
            SessionOutcome::ExtractionFailed { raw }
        } else {
            SessionOutcome::Filtered { text, raw }
        }
    }
}
