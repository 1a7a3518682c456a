//! # Simulated Kernel
//!
//! Thread table plus the `ExchangeRegisters` and `ThreadControl` models.

use crate::config::SimConfig;
use crate::thread::{IpcPhase, ObservedState, Registers, SimThread};
use alloc::collections::BTreeMap;
use helix_l4_sys::{
    ControlWord, ErrorCode, ExchangeArgs, ExchangeOutput, Kernel, ThreadControlArgs, ThreadId,
    Word, UTCB_UNCHANGED,
};
use spin::RwLock;

/// Simulated kernel
pub struct SimKernel {
    /// Configuration
    config: SimConfig,
    /// All threads by thread number
    threads: RwLock<BTreeMap<Word, SimThread>>,
    /// Next UTCB slot per address space
    utcb_cursor: RwLock<BTreeMap<Word, Word>>,
}

impl SimKernel {
    /// Create a kernel with its interrupt pseudo-threads
    pub fn new(config: SimConfig) -> Self {
        let mut threads = BTreeMap::new();
        for irq in 0..config.interrupt_count {
            let id = ThreadId::global(irq, config.version);
            let mut thread = SimThread::new(id, ThreadId::NIL, irq);
            thread.pager = id;
            thread.interrupt = true;
            threads.insert(irq, thread);
        }

        Self {
            config,
            threads: RwLock::new(threads),
            utcb_cursor: RwLock::new(BTreeMap::new()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Global id of interrupt pseudo-thread `irq`
    pub fn interrupt(&self, irq: Word) -> Option<ThreadId> {
        (irq < self.config.interrupt_count).then(|| ThreadId::global(irq, self.config.version))
    }

    /// Create a thread heading a new address space
    pub fn spawn_space(&self, privileged: bool) -> Option<ThreadId> {
        let thread_no = self.next_thread_no();
        let local = self.allocate_utcb(thread_no)?;
        let global = ThreadId::global(thread_no, self.config.version);
        let mut thread = SimThread::new(global, local, thread_no);
        thread.privileged = privileged;

        log::debug!("sim: spawned {:?} in new space", global);
        self.threads.write().insert(thread_no, thread);
        Some(global)
    }

    /// Create a thread in the address space of `sibling`
    pub fn spawn_in(&self, sibling: ThreadId) -> Option<ThreadId> {
        let (space, pager, privileged) = {
            let threads = self.threads.read();
            let t = threads.get(&sibling.thread_no())?;
            (t.space, t.pager, t.privileged)
        };
        let thread_no = self.next_thread_no();
        let local = self.allocate_utcb(space)?;
        let global = ThreadId::global(thread_no, self.config.version);
        let mut thread = SimThread::new(global, local, space);
        thread.pager = pager;
        thread.privileged = privileged;

        log::debug!("sim: spawned {:?} in space {}", global, space);
        self.threads.write().insert(thread_no, thread);
        Some(global)
    }

    /// Bind a caller identity
    pub fn caller(&self, id: ThreadId) -> SimCaller<'_> {
        SimCaller { kernel: self, caller: id }
    }

    /// Snapshot of a thread
    pub fn thread(&self, id: ThreadId) -> Option<SimThread> {
        self.threads.read().get(&id.thread_no()).cloned()
    }

    /// Externally visible state of a thread
    pub fn observe(&self, id: ThreadId) -> Option<ObservedState> {
        self.threads.read().get(&id.thread_no()).map(SimThread::observe)
    }

    /// Current registers of a thread
    pub fn registers(&self, id: ThreadId) -> Option<Registers> {
        self.threads.read().get(&id.thread_no()).map(|t| t.registers)
    }

    /// Overwrite the registers of a thread, as if it had run
    pub fn set_registers(&self, id: ThreadId, registers: Registers) -> bool {
        self.with_thread(id, |t| t.registers = registers)
    }

    /// Put a thread into a blocking receive
    pub fn begin_receive(&self, id: ThreadId) -> bool {
        self.with_thread(id, |t| t.ipc = Some(IpcPhase::Receive))
    }

    /// Put a thread into a blocking send
    pub fn begin_send(&self, id: ThreadId) -> bool {
        self.with_thread(id, |t| t.ipc = Some(IpcPhase::Send))
    }

    /// Complete the pending IPC phase of a thread
    ///
    /// A thread halted while blocked becomes Halted; one that was not halted
    /// runs on.
    pub fn end_ipc(&self, id: ThreadId) -> bool {
        self.with_thread(id, |t| t.ipc = None)
    }

    fn with_thread(&self, id: ThreadId, f: impl FnOnce(&mut SimThread)) -> bool {
        match self.threads.write().get_mut(&id.thread_no()) {
            Some(t) => {
                f(t);
                true
            }
            None => false,
        }
    }

    fn next_thread_no(&self) -> Word {
        self.threads
            .read()
            .keys()
            .next_back()
            .map_or(self.config.first_user_thread, |last| {
                (last + 1).max(self.config.first_user_thread)
            })
    }

    fn allocate_utcb(&self, space: Word) -> Option<ThreadId> {
        let mut cursor = self.utcb_cursor.write();
        let slot = cursor.entry(space).or_insert(0);
        if *slot >= self.config.utcb_slots() {
            log::warn!("sim: UTCB area of space {} exhausted", space);
            return None;
        }
        let location = self.config.utcb_slot(*slot)?;
        *slot += 1;
        Some(ThreadId::local(location))
    }

    /// Resolve an id as seen from `space`
    fn resolve(threads: &BTreeMap<Word, SimThread>, space: Word, id: ThreadId) -> Option<Word> {
        if id.is_nil() {
            return None;
        }
        if id.is_global() {
            let t = threads.get(&id.thread_no())?;
            return (t.global == id).then_some(id.thread_no());
        }
        threads
            .iter()
            .find(|(_, t)| t.space == space && t.local == id && !t.interrupt)
            .map(|(no, _)| *no)
    }

    fn fail(threads: &mut BTreeMap<Word, SimThread>, caller: ThreadId, code: Word) {
        log::debug!("sim: {:?} failed with {}", caller, ErrorCode::from_raw(code));
        if let Some(t) = threads.get_mut(&caller.thread_no()) {
            t.error_code = code;
        }
    }

    fn exchange_registers(&self, caller: ThreadId, args: ExchangeArgs) -> ExchangeOutput {
        let mut threads = self.threads.write();
        let space = match threads.get(&caller.thread_no()) {
            Some(t) => t.space,
            None => return ExchangeOutput::default(),
        };
        let Some(target_no) = Self::resolve(&threads, space, args.target) else {
            Self::fail(&mut threads, caller, ErrorCode::INVALID_THREAD);
            return ExchangeOutput::default();
        };
        if threads.get(&target_no).map_or(true, |t| t.interrupt) {
            Self::fail(&mut threads, caller, ErrorCode::INVALID_THREAD);
            return ExchangeOutput::default();
        }
        let Some(t) = threads.get_mut(&target_no) else {
            return ExchangeOutput::default();
        };

        let control = args.control;
        let mut out = ExchangeOutput {
            result: if args.target.is_local() { t.global } else { t.local },
            control: t.state_bits().bits() | t.ctrlxfer.bits(),
            ..ExchangeOutput::default()
        };
        if control.contains(ControlWord::DELIVER) {
            out.sp = t.registers.sp;
            out.ip = t.registers.ip;
            out.flags = t.registers.flags;
            out.handle = t.handle;
            out.pager = t.pager;
        }

        if control.toggles_ctrlxfer() {
            t.ctrlxfer ^= control & ControlWord::CTRLXFER_ITEMS;
            return out;
        }

        t.abort_ipc(control);
        if control.contains(ControlWord::SET_SP) {
            t.registers.sp = args.sp;
        }
        if control.contains(ControlWord::SET_IP) {
            t.registers.ip = args.ip;
        }
        if control.contains(ControlWord::SET_FLAGS) {
            t.registers.flags = args.flags;
        }
        if control.contains(ControlWord::SET_USER_HANDLE) {
            t.handle = args.handle;
        }
        if control.contains(ControlWord::SET_PAGER) {
            t.pager = args.pager;
        }
        if control.changes_run_state() {
            t.halted = control.contains(ControlWord::HALT);
        }
        out
    }

    fn thread_control(&self, caller: ThreadId, args: ThreadControlArgs) -> Word {
        let mut threads = self.threads.write();
        let (space, privileged) = match threads.get(&caller.thread_no()) {
            Some(t) => (t.space, t.privileged),
            None => return ErrorCode::INVALID_THREAD,
        };

        let code = if !privileged {
            ErrorCode::NO_PRIVILEGE
        } else if Self::resolve(&threads, space, args.dest).is_none() {
            ErrorCode::INVALID_THREAD
        } else if Self::resolve(&threads, space, args.space).is_none() {
            ErrorCode::INVALID_SPACE
        } else if !args.scheduler.is_nil()
            && Self::resolve(&threads, space, args.scheduler).is_none()
        {
            ErrorCode::INVALID_SCHEDULER
        } else if !args.pager.is_nil() && Self::resolve(&threads, space, args.pager).is_none() {
            ErrorCode::INVALID_THREAD
        } else if args.utcb_location != UTCB_UNCHANGED
            && !self.config.is_utcb_slot(args.utcb_location)
        {
            ErrorCode::UTCB_AREA
        } else {
            ErrorCode::OK
        };
        if code != ErrorCode::OK {
            Self::fail(&mut threads, caller, code);
            return code;
        }

        let (Some(dest_no), Some(space_no)) = (
            Self::resolve(&threads, space, args.dest),
            Self::resolve(&threads, space, args.space),
        ) else {
            return ErrorCode::INVALID_THREAD;
        };
        let new_space = threads.get(&space_no).map_or(space_no, |t| t.space);
        if let Some(t) = threads.get_mut(&dest_no) {
            t.space = new_space;
            if !args.scheduler.is_nil() {
                t.scheduler = args.scheduler;
            }
            if !args.pager.is_nil() {
                t.pager = args.pager;
            }
            if args.utcb_location != UTCB_UNCHANGED {
                t.local = ThreadId::local(args.utcb_location);
            }
        }
        ErrorCode::OK
    }
}

/// The simulated kernel as seen by one calling thread
#[derive(Clone, Copy)]
pub struct SimCaller<'k> {
    kernel: &'k SimKernel,
    caller: ThreadId,
}

impl SimCaller<'_> {
    /// Global id of the calling thread
    pub fn id(&self) -> ThreadId {
        self.caller
    }
}

impl Kernel for SimCaller<'_> {
    fn exchange_registers(&self, args: ExchangeArgs) -> ExchangeOutput {
        log::trace!(
            "sim: {:?} exchange_registers({:?}, {:#x})",
            self.caller,
            args.target,
            args.control.bits()
        );
        self.kernel.exchange_registers(self.caller, args)
    }

    fn thread_control(&self, args: ThreadControlArgs) -> Word {
        log::trace!("sim: {:?} thread_control({:?})", self.caller, args);
        self.kernel.thread_control(self.caller, args)
    }

    fn error_code(&self) -> Word {
        self.kernel
            .threads
            .read()
            .get(&self.caller.thread_no())
            .map_or(ErrorCode::INVALID_THREAD, |t| t.error_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_l4_sys::{AbortIpc, CtrlXferItem, RegisterWrite, ThreadState};

    fn setup() -> (SimKernel, ThreadId, ThreadId) {
        let kernel = SimKernel::new(SimConfig::default());
        let root = kernel.spawn_space(true).expect("root");
        let worker = kernel.spawn_in(root).expect("worker");
        (kernel, root, worker)
    }

    // =========================================================================
    // Thread table
    // =========================================================================

    #[test]
    fn test_spawn_assigns_ids() {
        let (kernel, root, worker) = setup();
        assert!(root.is_global());
        assert_eq!(root.thread_no(), kernel.config().first_user_thread);
        assert_eq!(worker.thread_no(), root.thread_no() + 1);

        let r = kernel.thread(root).unwrap();
        let w = kernel.thread(worker).unwrap();
        assert_eq!(r.space, w.space);
        assert_ne!(r.local, w.local);
        assert!(r.local.is_local());
    }

    #[test]
    fn test_interrupt_threads_page_themselves() {
        let kernel = SimKernel::new(SimConfig::default());
        let irq = kernel.interrupt(5).unwrap();
        assert_eq!(kernel.thread(irq).unwrap().pager, irq);
        assert!(kernel.interrupt(kernel.config().interrupt_count).is_none());
    }

    // =========================================================================
    // ExchangeRegisters
    // =========================================================================

    #[test]
    fn test_unknown_target_sets_error() {
        let (kernel, root, _) = setup();
        let caller = kernel.caller(root);
        let out = caller.exchange_registers(ExchangeArgs::new(
            ThreadId::global(999, 1),
            ControlWord::QUERY,
        ));
        assert!(!out.succeeded());
        assert_eq!(caller.error_code(), ErrorCode::INVALID_THREAD);
    }

    #[test]
    fn test_query_returns_other_form() {
        let (kernel, root, worker) = setup();
        let caller = kernel.caller(root);
        let local = kernel.thread(worker).unwrap().local;

        let out = caller.exchange_registers(ExchangeArgs::new(worker, ControlWord::QUERY));
        assert_eq!(out.result, local);
        let out = caller.exchange_registers(ExchangeArgs::new(local, ControlWord::QUERY));
        assert_eq!(out.result, worker);
    }

    #[test]
    fn test_query_changes_nothing() {
        let (kernel, root, worker) = setup();
        let before = kernel.thread(worker).unwrap();
        kernel
            .caller(root)
            .exchange_registers(ExchangeArgs::new(worker, ControlWord::QUERY));
        let after = kernel.thread(worker).unwrap();
        assert_eq!(before.registers, after.registers);
        assert_eq!(before.halted, after.halted);
        assert_eq!(before.ctrlxfer, after.ctrlxfer);
    }

    #[test]
    fn test_resume_writes_selected_registers() {
        let (kernel, root, worker) = setup();
        kernel.set_registers(worker, Registers { sp: 1, ip: 2, flags: 3 });
        let writes = RegisterWrite { sp: None, ip: Some(0x4000), flags: None };
        kernel.caller(root).exchange_registers(
            ExchangeArgs::new(worker, ControlWord::resume(&writes)).registers(9, 0x4000, 9),
        );
        assert_eq!(
            kernel.registers(worker),
            Some(Registers { sp: 1, ip: 0x4000, flags: 3 })
        );
        assert_eq!(kernel.observe(worker), Some(ObservedState::Running));
    }

    #[test]
    fn test_halt_reports_previous_state() {
        let (kernel, root, worker) = setup();
        let caller = kernel.caller(root);
        caller.exchange_registers(ExchangeArgs::new(
            worker,
            ControlWord::resume(&RegisterWrite::none()),
        ));
        kernel.begin_send(worker);

        let out = caller.exchange_registers(ExchangeArgs::new(
            worker,
            ControlWord::halt(AbortIpc::Both),
        ));
        let state = ThreadState::from_control(out.control);
        assert!(!state.was_halted());
        assert!(state.was_sending());
        assert_eq!(kernel.observe(worker), Some(ObservedState::Halted));
    }

    #[test]
    fn test_ctrlxfer_toggle() {
        let (kernel, root, worker) = setup();
        let caller = kernel.caller(root);
        let read = ControlWord::ctrlxfer(CtrlXferItem::Read);

        let first = caller.exchange_registers(ExchangeArgs::new(worker, read));
        assert_eq!(first.control & read.bits(), 0);
        let second = caller.exchange_registers(ExchangeArgs::new(worker, read));
        assert_eq!(second.control & read.bits(), read.bits());
        assert!(kernel.thread(worker).unwrap().ctrlxfer.is_empty());
    }

    #[test]
    fn test_interrupt_target_rejected_unchanged() {
        let (kernel, root, _) = setup();
        let caller = kernel.caller(root);
        let irq = kernel.interrupt(2).unwrap();

        let out = caller.exchange_registers(
            ExchangeArgs::new(irq, ControlWord::WRITE_USER_HANDLE).handle(0x77),
        );
        assert!(!out.succeeded());
        assert_eq!(caller.error_code(), ErrorCode::INVALID_THREAD);
        assert_eq!(kernel.thread(irq).unwrap().handle, 0);
        assert!(kernel.thread(irq).unwrap().halted);
    }

    #[test]
    fn test_deliver_word_changes_nothing() {
        let (kernel, root, worker) = setup();
        let caller = kernel.caller(root);

        let out = caller.exchange_registers(ExchangeArgs::new(
            worker,
            ControlWord::READ_ASSOCIATIONS,
        ));
        assert!(out.succeeded());
        assert!(kernel.thread(worker).unwrap().ctrlxfer.is_empty());
    }

    #[test]
    fn test_end_ipc_after_halt() {
        let (kernel, root, worker) = setup();
        kernel.begin_receive(worker);
        kernel.caller(root).exchange_registers(ExchangeArgs::new(
            worker,
            ControlWord::halt(AbortIpc::Send),
        ));
        assert_eq!(kernel.observe(worker), Some(ObservedState::Receiving));

        assert!(kernel.end_ipc(worker));
        assert_eq!(kernel.observe(worker), Some(ObservedState::Halted));
        assert!(!kernel.end_ipc(ThreadId::global(999, 1)));
    }

    #[test]
    fn test_zero_slot_size_spawns_nothing() {
        let config = SimConfig { utcb_size: 0, ..SimConfig::default() };
        let kernel = SimKernel::new(config);
        assert!(kernel.spawn_space(true).is_none());
    }

    // =========================================================================
    // ThreadControl
    // =========================================================================

    #[test]
    fn test_thread_control_requires_privilege() {
        let kernel = SimKernel::new(SimConfig::default());
        let user = kernel.spawn_space(false).unwrap();
        let irq = kernel.interrupt(1).unwrap();
        let caller = kernel.caller(user);
        assert_eq!(
            caller.thread_control(ThreadControlArgs::repage(irq, user)),
            ErrorCode::NO_PRIVILEGE
        );
        assert_eq!(caller.error_code(), ErrorCode::NO_PRIVILEGE);
    }

    #[test]
    fn test_thread_control_validates_arguments() {
        let (kernel, root, worker) = setup();
        let caller = kernel.caller(root);
        let ghost = ThreadId::global(999, 1);

        assert_eq!(
            caller.thread_control(ThreadControlArgs::repage(ghost, root)),
            ErrorCode::INVALID_THREAD
        );
        let mut args = ThreadControlArgs::repage(worker, root);
        args.space = ghost;
        assert_eq!(caller.thread_control(args), ErrorCode::INVALID_SPACE);

        let mut args = ThreadControlArgs::repage(worker, root);
        args.scheduler = ghost;
        assert_eq!(caller.thread_control(args), ErrorCode::INVALID_SCHEDULER);

        let mut args = ThreadControlArgs::repage(worker, root);
        args.utcb_location = kernel.config().utcb_area_base + 0x40;
        assert_eq!(caller.thread_control(args), ErrorCode::UTCB_AREA);
    }

    #[test]
    fn test_thread_control_repages() {
        let (kernel, root, _) = setup();
        let irq = kernel.interrupt(3).unwrap();
        let caller = kernel.caller(root);
        assert_eq!(
            caller.thread_control(ThreadControlArgs::repage(irq, root)),
            ErrorCode::OK
        );
        assert_eq!(kernel.thread(irq).unwrap().pager, root);
        assert_eq!(kernel.thread(irq).unwrap().space, irq.thread_no());
    }
}
