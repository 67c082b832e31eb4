use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use crate::codec::serialize_deck;
use crate::engine::bot::{play_best_move, BotOptions};
use crate::game::{Game, GameError, GameRules};

/// Deferred-task abstraction the generator schedules its attempt slices on.
/// Hosts inject their own timer queue or pool; the default spawns a thread
/// per slice.
pub trait TaskScheduler: Send + Sync {
    fn schedule(&self, task: Box<dyn FnOnce() + Send>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadScheduler;

impl TaskScheduler for ThreadScheduler {
    fn schedule(&self, task: Box<dyn FnOnce() + Send>) {
        thread::spawn(task);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GeneratorOptions {
    pub rules: GameRules,
    pub bot: BotOptions,
    pub max_moves_per_attempt: usize,
    pub max_millis_per_attempt: u64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            rules: GameRules::klondike(),
            bot: BotOptions::default(),
            max_moves_per_attempt: 400,
            max_millis_per_attempt: 2_000,
        }
    }
}

struct GeneratorShared {
    options: GeneratorOptions,
    scheduler: Arc<dyn TaskScheduler>,
    running: AtomicBool,
    attempt_active: AtomicBool,
}

/// Searches for solvable initial deals by letting the bot play fresh
/// shuffles, one cancellable attempt per scheduled slice.
pub struct WinnableGamesGenerator {
    shared: Arc<GeneratorShared>,
}

impl WinnableGamesGenerator {
    /// Configuration errors are fatal here, before anything is scheduled.
    pub fn new(
        options: GeneratorOptions,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Result<Self, GameError> {
        options.rules.validate()?;
        options.bot.validate()?;
        if options.max_moves_per_attempt == 0 {
            return Err(GameError::InvalidRules(
                "max_moves_per_attempt must be positive".to_string(),
            ));
        }
        if options.max_millis_per_attempt == 0 {
            return Err(GameError::InvalidRules(
                "max_millis_per_attempt must be positive".to_string(),
            ));
        }
        Ok(WinnableGamesGenerator {
            shared: Arc::new(GeneratorShared {
                options,
                scheduler,
                running: AtomicBool::new(false),
                attempt_active: AtomicBool::new(false),
            }),
        })
    }

    /// Continuous mode: one attempt per slice, `progress` invoked after each
    /// with the last winnable deck found so far (None until the first). A
    /// second call while running is a no-op.
    pub fn run<F>(&self, progress: F)
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        schedule_next(Arc::clone(&self.shared), Arc::new(progress), None);
    }

    /// Takes effect at the next yield point between attempts.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// One-shot mode: an isolated sub-generator that resolves with the first
    /// winnable deck it finds and stops rescheduling itself after success or
    /// cancellation.
    pub fn generate_one(&self) -> WinnableGameHandle {
        let cancel = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::channel();
        schedule_one_shot(
            Arc::clone(&self.shared.scheduler),
            self.shared.options,
            Arc::clone(&cancel),
            sender,
        );
        WinnableGameHandle { receiver, cancel }
    }
}

fn schedule_next(
    shared: Arc<GeneratorShared>,
    progress: Arc<dyn Fn(Option<&str>) + Send + Sync>,
    last_found: Option<String>,
) {
    let scheduler = Arc::clone(&shared.scheduler);
    scheduler.schedule(Box::new(move || {
        if !shared.running.load(Ordering::SeqCst) {
            return;
        }
        if shared.attempt_active.swap(true, Ordering::SeqCst) {
            return;
        }
        let found = run_attempt(&shared.options, None);
        shared.attempt_active.store(false, Ordering::SeqCst);

        let last_found = found.or(last_found);
        progress(last_found.as_deref());
        if shared.running.load(Ordering::SeqCst) {
            schedule_next(shared, progress, last_found);
        }
    }));
}

fn schedule_one_shot(
    scheduler: Arc<dyn TaskScheduler>,
    options: GeneratorOptions,
    cancel: Arc<AtomicBool>,
    sender: mpsc::Sender<String>,
) {
    let next_slice = Arc::clone(&scheduler);
    scheduler.schedule(Box::new(move || {
        if cancel.load(Ordering::SeqCst) {
            return;
        }
        match run_attempt(&options, Some(&cancel)) {
            Some(deck) => {
                let _ = sender.send(deck);
            }
            None => schedule_one_shot(next_slice, options, cancel, sender),
        }
    }));
}

fn run_attempt(options: &GeneratorOptions, cancel: Option<&AtomicBool>) -> Option<String> {
    let game = match Game::new_shuffled(options.rules) {
        Ok(game) => game,
        Err(err) => {
            tracing::debug!(%err, "could not set up a generator attempt");
            return None;
        }
    };
    run_attempt_with_game(game, options, cancel)
}

/// Plays one game to victory, a cap, or no progress. Errors inside an
/// attempt count as a failed attempt and are never propagated.
pub(crate) fn run_attempt_with_game(
    mut game: Game,
    options: &GeneratorOptions,
    cancel: Option<&AtomicBool>,
) -> Option<String> {
    let started = Instant::now();
    for _ in 0..options.max_moves_per_attempt {
        if cancel.map(|c| c.load(Ordering::SeqCst)).unwrap_or(false) {
            return None;
        }
        if game.is_won() {
            break;
        }
        if started.elapsed().as_millis() as u64 > options.max_millis_per_attempt {
            tracing::debug!("generator attempt hit the time cap");
            return None;
        }
        let next = match play_best_move(&game, &options.bot) {
            Ok(next) => next,
            Err(err) => {
                tracing::debug!(%err, "bot failed, abandoning the attempt");
                return None;
            }
        };
        if next == game {
            return None;
        }
        game = next;
    }
    if !game.is_won() {
        return None;
    }
    match serialize_deck(&game) {
        Ok(deck) => {
            tracing::debug!(moves = game.move_count(), "found a winnable deal");
            Some(deck)
        }
        Err(err) => {
            tracing::debug!(%err, "could not serialize a winnable deal");
            None
        }
    }
}

/// Cancellable handle for a one-shot generation.
pub struct WinnableGameHandle {
    receiver: mpsc::Receiver<String>,
    cancel: Arc<AtomicBool>,
}

impl WinnableGameHandle {
    /// Observed at the next yield point between attempts.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Blocks until a deck is found or the search was cancelled.
    pub fn wait(&self) -> Option<String> {
        self.receiver.recv().ok()
    }

    pub fn try_take(&self) -> Option<String> {
        self.receiver.try_recv().ok()
    }
}
