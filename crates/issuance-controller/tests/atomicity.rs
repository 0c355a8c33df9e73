//! Failure paths: every rejected execution leaves pool and controller untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;

use issuance_controller::{
    AllowList, Collaborators, IssuanceController, ManualClock, MemoryToken, RecordingTransport,
    StaticFundsManager, TokenLedger, TokenManager,
};
use issuance_core::{
    CollaboratorError, ConvergenceStrategy, IssuanceConfig, IssuanceError, RateCapped,
    RATIO_PRECISION,
};
use proptest::prelude::*;

const E18: u128 = 1_000_000_000_000_000_000;
const DAY: u64 = 86_400;
const START: u64 = 1_700_000_000;
const POOL: &str = "common-pool";

fn config(delay: u64, bridge_destination: Option<&str>) -> IssuanceConfig {
    IssuanceConfig {
        target_ratio: RATIO_PRECISION / 5,
        convergence: ConvergenceStrategy::RateCapped(RateCapped {
            max_adjustment_per_second: E18 / 1000,
        }),
        execute_adjustment_delay: delay,
        bridge_destination: bridge_destination.map(str::to_string),
    }
}

fn seeded_token(balance: u128) -> Arc<MemoryToken> {
    Arc::new(
        MemoryToken::new()
            .with_balance(POOL, balance)
            .with_balance("holders", 100 * E18 - balance),
    )
}

fn collaborators(
    token: Arc<MemoryToken>,
    token_manager: Arc<dyn TokenManager>,
    clock: &ManualClock,
) -> Collaborators {
    Collaborators {
        ledger: token,
        token_manager,
        funds_manager: Arc::new(StaticFundsManager::new(POOL)),
        authorizer: Arc::new(AllowList::new()),
        clock: Arc::new(clock.clone()),
        bridge: None,
    }
}

// ── Token manager failures ─────────────────────────────────────────

/// Token manager that refuses to mint or burn while switched off.
struct Switchable {
    token: Arc<MemoryToken>,
    enabled: AtomicBool,
}

impl TokenManager for Switchable {
    fn mint(&self, to: &str, amount: u128) -> Result<(), CollaboratorError> {
        if !self.enabled.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Rejected("mint permission revoked".to_string()));
        }
        self.token.mint(to, amount)
    }

    fn burn(&self, from: &str, amount: u128) -> Result<(), CollaboratorError> {
        if !self.enabled.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Rejected("burn permission revoked".to_string()));
        }
        self.token.burn(from, amount)
    }
}

#[test]
fn token_manager_failure_changes_nothing() {
    let token = seeded_token(30 * E18);
    let manager = Arc::new(Switchable {
        token: token.clone(),
        enabled: AtomicBool::new(false),
    });
    let clock = ManualClock::new(START);
    let controller =
        IssuanceController::initialize(config(0, None), collaborators(token.clone(), manager.clone(), &clock))
            .unwrap();
    clock.advance(10 * DAY);

    let before = controller.state();
    assert!(matches!(
        controller.execute_adjustment(),
        Err(IssuanceError::Collaborator(CollaboratorError::Rejected(_)))
    ));
    assert_eq!(controller.state(), before);
    assert_eq!(token.balance_of(POOL).unwrap(), 30 * E18);
    assert_eq!(token.total_supply().unwrap(), 100 * E18);

    // Elapsed time was not consumed by the failed call.
    manager.enabled.store(true, Ordering::SeqCst);
    let record = controller.execute_adjustment().unwrap();
    assert_eq!(record.elapsed_seconds, 10 * DAY);
}

// ── Bridge failures ────────────────────────────────────────────────

#[test]
fn bridge_failure_reverts_burn() {
    let token = seeded_token(30 * E18);
    let transport = Arc::new(RecordingTransport::new());
    transport.set_failing(true);
    let clock = ManualClock::new(START);
    let mut collaborators = collaborators(token.clone(), token.clone(), &clock);
    collaborators.bridge = Some(transport.clone());
    let controller = IssuanceController::initialize(config(0, Some("xdai")), collaborators).unwrap();
    clock.advance(10 * DAY);

    let before = controller.state();
    assert!(matches!(
        controller.execute_adjustment(),
        Err(IssuanceError::Bridge(_))
    ));
    assert_eq!(controller.state(), before);
    assert_eq!(token.balance_of(POOL).unwrap(), 30 * E18);
    assert_eq!(token.total_supply().unwrap(), 100 * E18);
    assert!(transport.sent().is_empty());

    transport.set_failing(false);
    let record = controller.execute_adjustment().unwrap();
    assert_eq!(record.amount, 1_369_863_013_622_400_000);
    assert_eq!(transport.sent().len(), 1);
}

#[test]
fn bridge_failure_reverts_mint() {
    let token = seeded_token(10 * E18);
    let transport = Arc::new(RecordingTransport::new());
    transport.set_failing(true);
    let clock = ManualClock::new(START);
    let mut collaborators = collaborators(token.clone(), token.clone(), &clock);
    collaborators.bridge = Some(transport);
    let controller = IssuanceController::initialize(config(0, Some("xdai")), collaborators).unwrap();
    clock.advance(16 * DAY);

    assert!(controller.execute_adjustment().is_err());
    assert_eq!(token.balance_of(POOL).unwrap(), 10 * E18);
    assert_eq!(token.total_supply().unwrap(), 100 * E18);
    assert_eq!(controller.previous_adjustment_second(), START);
}

// ── Reentrancy ─────────────────────────────────────────────────────

/// Token manager that calls back into the controller mid-burn.
struct Reentrant {
    token: Arc<MemoryToken>,
    controller: OnceLock<Weak<IssuanceController>>,
    nested: Mutex<Vec<Result<(), IssuanceError>>>,
}

impl Reentrant {
    fn reenter(&self) {
        if let Some(controller) = self.controller.get().and_then(Weak::upgrade) {
            let result = controller.execute_adjustment().map(|_| ());
            self.nested.lock().unwrap().push(result);
        }
    }
}

impl TokenManager for Reentrant {
    fn mint(&self, to: &str, amount: u128) -> Result<(), CollaboratorError> {
        self.reenter();
        self.token.mint(to, amount)
    }

    fn burn(&self, from: &str, amount: u128) -> Result<(), CollaboratorError> {
        self.reenter();
        self.token.burn(from, amount)
    }
}

#[test]
fn reentrant_execution_is_rejected() {
    let token = seeded_token(30 * E18);
    let manager = Arc::new(Reentrant {
        token: token.clone(),
        controller: OnceLock::new(),
        nested: Mutex::new(Vec::new()),
    });
    let clock = ManualClock::new(START);
    let controller = Arc::new(
        IssuanceController::initialize(config(0, None), collaborators(token.clone(), manager.clone(), &clock))
            .unwrap(),
    );
    manager.controller.set(Arc::downgrade(&controller)).unwrap();
    clock.advance(10 * DAY);

    let record = controller.execute_adjustment().unwrap();
    assert_eq!(
        *manager.nested.lock().unwrap(),
        vec![Err(IssuanceError::ExecutionInProgress)]
    );
    assert_eq!(token.balance_of(POOL).unwrap(), 30 * E18 - record.amount);
}

/// Token manager that parks inside `burn` until released.
struct Blocking {
    token: Arc<MemoryToken>,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl TokenManager for Blocking {
    fn mint(&self, to: &str, amount: u128) -> Result<(), CollaboratorError> {
        self.token.mint(to, amount)
    }

    fn burn(&self, from: &str, amount: u128) -> Result<(), CollaboratorError> {
        let _ = self.entered.lock().unwrap().send(());
        let _ = self.release.lock().unwrap().recv();
        self.token.burn(from, amount)
    }
}

#[test]
fn concurrent_execution_is_rejected() {
    let token = seeded_token(30 * E18);
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let manager = Arc::new(Blocking {
        token: token.clone(),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let clock = ManualClock::new(START);
    let controller = Arc::new(
        IssuanceController::initialize(config(0, None), collaborators(token, manager, &clock)).unwrap(),
    );
    clock.advance(DAY);

    let background = {
        let controller = controller.clone();
        thread::spawn(move || controller.execute_adjustment())
    };
    entered_rx.recv().unwrap();

    assert_eq!(
        controller.execute_adjustment(),
        Err(IssuanceError::ExecutionInProgress)
    );
    // Settings and accessors stay available while an execution is in flight.
    assert_eq!(controller.previous_adjustment_second(), START);

    release_tx.send(()).unwrap();
    assert!(background.join().unwrap().is_ok());
    assert_eq!(controller.previous_adjustment_second(), START + DAY);
}

// ── Delay gate ─────────────────────────────────────────────────────

#[test]
fn clock_going_backwards_never_rewinds_gate() {
    let token = seeded_token(30 * E18);
    let clock = ManualClock::new(START);
    let controller =
        IssuanceController::initialize(config(0, None), collaborators(token.clone(), token, &clock))
            .unwrap();
    clock.advance(DAY);
    controller.execute_adjustment().unwrap();

    clock.set(START);
    let record = controller.execute_adjustment().unwrap();
    assert_eq!(record.elapsed_seconds, 0);
    assert_eq!(record.amount, 0);
    assert_eq!(controller.previous_adjustment_second(), START + DAY);
}

proptest! {
    #[test]
    fn gate_is_monotonic_and_pool_never_crosses(
        balance in 0u128..=100,
        steps in prop::collection::vec(0u64..400 * DAY, 1..12),
    ) {
        let token = seeded_token(balance * E18);
        let clock = ManualClock::new(START);
        let controller = IssuanceController::initialize(
            config(0, None),
            collaborators(token.clone(), token.clone(), &clock),
        )
        .unwrap();

        let above = balance * E18 * 5 > 100 * E18;
        let mut previous = controller.previous_adjustment_second();
        for step in steps {
            clock.advance(step);
            let record = controller.execute_adjustment().unwrap();
            prop_assert!(controller.previous_adjustment_second() >= previous);
            previous = controller.previous_adjustment_second();

            if above {
                prop_assert!(record.balance_after >= record.target_amount);
            } else {
                prop_assert!(record.balance_after <= record.target_amount);
            }
        }
    }
}
