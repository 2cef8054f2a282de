use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use core::cell::{Cell, Ref, RefCell, RefMut};
use core::time::Duration;

use og_graph::{Heap, Interpreter, MethodHost, NativeMethod, Object, ObjectRef, Value};
use og_task::{CancelToken, Throttle};
use og_utils::{HashMap, HashSet};

use crate::cursor::Cursor;
use crate::error::Error;
use crate::node::Node;
use crate::registry::TypeRegistry;
use crate::{de, progress, ser};

type StartFn = Box<dyn FnMut(usize, &Node)>;
type ProgressFn = Box<dyn FnMut(usize, usize, &Node)>;
type FinishFn = Box<dyn FnMut()>;

// -----------------------------------------------------------------------------
// Progress

/// Progress counters of the last top-level deserialize call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

struct ProgressState {
    processed: usize,
    total: usize,
    throttle: Throttle,
}

#[derive(Default)]
struct Callbacks {
    on_start: Option<StartFn>,
    on_progress: Option<ProgressFn>,
    on_finish: Option<FinishFn>,
}

/// Bidirectional id table of a session.
#[derive(Default)]
struct RefTable {
    ids: HashMap<String, ObjectRef>,
    keys: HashMap<ObjectRef, String>,
    next: usize,
}

/// Result of [`deserialize`](crate::deserialize).
#[derive(Debug)]
pub struct Loaded {
    pub root: Value,
    pub heap: Heap,
}

// -----------------------------------------------------------------------------
// Context

/// State of one serialize or deserialize session.
///
/// The context owns the heap of the live graph and the reference table that
/// binds node ids to heap objects. Ids bound while loading are reused when the
/// same objects are serialized again, so a loaded graph keeps its ids.
///
/// Top-level calls to [`deserialize`](Self::deserialize) estimate the amount
/// of work, fire `on_start`, report throttled `on_progress` and fire
/// `on_finish` on success. Calls made while a load is running (for example
/// from a custom converter) only reconstruct their node.
///
/// # Examples
///
/// ```
/// use og_serde::{Context, Node, ObjectNode, TypeRegistry};
///
/// let registry = TypeRegistry::new();
/// let cx = Context::new(&registry);
///
/// let node = Node::from(ObjectNode::plain("cfg").with_data("depth", Node::from(3.0)));
/// let root = og_task::block_on(cx.deserialize(&node)).unwrap();
///
/// assert_eq!(cx.get_from_key("cfg"), root.as_object());
/// assert_eq!(cx.progress().processed, 1);
/// ```
pub struct Context<'r> {
    registry: &'r TypeRegistry,
    heap: RefCell<Heap>,
    refs: RefCell<RefTable>,
    seen: RefCell<HashSet<ObjectRef>>,
    progress: RefCell<ProgressState>,
    callbacks: RefCell<Callbacks>,
    loading: Cell<bool>,
    saving: Cell<bool>,
    allow_callables: bool,
    cancel: Option<CancelToken>,
}

impl<'r> Context<'r> {
    pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

    #[inline]
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self::builder(registry).build()
    }

    #[inline]
    pub fn builder(registry: &'r TypeRegistry) -> ContextBuilder<'r> {
        ContextBuilder::new(registry)
    }

    #[inline]
    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    /// Borrows the heap. Panics if it is mutably borrowed.
    #[inline]
    pub fn heap(&self) -> Ref<'_, Heap> {
        self.heap.borrow()
    }

    /// Borrows the heap mutably. Do not hold the guard across an `.await`.
    #[inline]
    pub fn heap_mut(&self) -> RefMut<'_, Heap> {
        self.heap.borrow_mut()
    }

    #[inline]
    pub fn into_heap(self) -> Heap {
        self.heap.into_inner()
    }

    #[inline]
    pub fn allows_callables(&self) -> bool {
        self.allow_callables
    }

    /// `true` while a top-level deserialize call is running.
    #[inline]
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn progress(&self) -> Progress {
        let state = self.progress.borrow();
        Progress {
            processed: state.processed,
            total: state.total,
        }
    }

    // -------------------------------------------------------------------------
    // Reference table

    /// Binds `id` to `object`.
    ///
    /// Binding the same pair again is a no-op; binding an id that already
    /// names another object fails with [`Error::DuplicateId`].
    pub fn add(&self, object: ObjectRef, id: &str) -> Result<(), Error> {
        let mut refs = self.refs.borrow_mut();
        match refs.ids.get(id) {
            Some(existing) if *existing == object => Ok(()),
            Some(_) => Err(Error::DuplicateId { id: String::from(id) }),
            None => {
                log::trace!("bind `{id}` to {object:?}");
                refs.ids.insert(String::from(id), object);
                refs.keys.entry(object).or_insert_with(|| String::from(id));
                Ok(())
            }
        }
    }

    /// The object bound to `id`.
    #[inline]
    pub fn get_from_key(&self, id: &str) -> Option<ObjectRef> {
        self.refs.borrow().ids.get(id).copied()
    }

    /// The first id bound to `object`.
    #[inline]
    pub fn id_of(&self, object: ObjectRef) -> Option<String> {
        self.refs.borrow().keys.get(&object).cloned()
    }

    /// Returns the id of `object`, binding one first if it has none.
    ///
    /// `preferred` is used when it is still free, otherwise a `#n` id is
    /// generated.
    pub(crate) fn assign_id(&self, object: ObjectRef, preferred: Option<&str>) -> String {
        let mut refs = self.refs.borrow_mut();
        if let Some(id) = refs.keys.get(&object) {
            return id.clone();
        }
        let id = match preferred {
            Some(id) if !refs.ids.contains_key(id) => String::from(id),
            _ => loop {
                let candidate = format!("#{}", refs.next);
                refs.next += 1;
                if !refs.ids.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        refs.ids.insert(id.clone(), object);
        refs.keys.insert(object, id.clone());
        id
    }

    /// Marks `object` as emitted; `false` if it already was in this call.
    #[inline]
    pub(crate) fn mark_seen(&self, object: ObjectRef) -> bool {
        self.seen.borrow_mut().insert(object)
    }

    // -------------------------------------------------------------------------
    // Sessions

    /// Reconstructs `node` as a top-level node.
    #[inline]
    pub async fn deserialize(&self, node: &Node) -> Result<Value, Error> {
        self.deserialize_at(node, Cursor::root()).await
    }

    /// Reconstructs `node` as if it were found at `cursor`.
    pub async fn deserialize_at(&self, node: &Node, cursor: Cursor) -> Result<Value, Error> {
        if self.loading.get() {
            return de::reconstruct(self, node, cursor).await;
        }
        let _loading = FlagGuard::raise(&self.loading);
        let total = progress::estimate_total(self.registry, node);
        self.start(total, node);
        let root = de::reconstruct(self, node, cursor).await?;
        self.finish();
        Ok(root)
    }

    /// Flattens `value` as a top-level value.
    #[inline]
    pub async fn serialize(&self, value: &Value) -> Result<Node, Error> {
        self.serialize_at(value, Cursor::root()).await
    }

    /// Flattens `value` as if it were found at `cursor`.
    ///
    /// Within one top-level call every object is emitted once; later
    /// occurrences become reference nodes.
    pub async fn serialize_at(&self, value: &Value, cursor: Cursor) -> Result<Node, Error> {
        if self.saving.get() {
            return ser::flatten(self, value, cursor).await;
        }
        let _saving = FlagGuard::raise(&self.saving);
        self.seen.borrow_mut().clear();
        ser::flatten(self, value, cursor).await
    }

    fn start(&self, total: usize, node: &Node) {
        {
            let mut state = self.progress.borrow_mut();
            state.processed = 0;
            state.total = total;
            state.throttle.reset();
        }
        log::debug!("deserialize started, {total} units");
        if let Some(on_start) = self.callbacks.borrow_mut().on_start.as_mut() {
            on_start(total, node);
        }
    }

    fn finish(&self) {
        let total = {
            let mut state = self.progress.borrow_mut();
            state.processed = state.total;
            state.total
        };
        log::debug!("deserialize finished, {total} units");
        if let Some(on_finish) = self.callbacks.borrow_mut().on_finish.as_mut() {
            on_finish();
        }
    }

    /// Counts one unit of work. `processed` never passes `total`.
    pub(crate) fn tick(&self, node: &Node) {
        let (processed, total) = {
            let mut state = self.progress.borrow_mut();
            if state.processed < state.total {
                state.processed += 1;
            }
            if !state.throttle.ready() {
                return;
            }
            (state.processed, state.total)
        };
        if let Some(on_progress) = self.callbacks.borrow_mut().on_progress.as_mut() {
            on_progress(processed, total, node);
        }
    }

    /// Fails with [`Error::Cancelled`] once the cancel token fired.
    #[inline]
    pub fn checkpoint(&self) -> Result<(), Error> {
        match &self.cancel {
            Some(token) => Ok(token.check()?),
            None => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Callables

    /// Runs the callable at `callable` with `this` bound to `this`.
    ///
    /// Native methods registered on the types of the graph are reachable as
    /// `this.name(..)`.
    pub fn call(&self, callable: ObjectRef, this: Option<ObjectRef>, args: &[Value]) -> Result<Value, Error> {
        let host = RegistryHost(self.registry);
        let mut heap = self.heap.borrow_mut();
        Ok(Interpreter::new(&mut *heap, &host).call(callable, this, args)?)
    }

    /// Invokes method `name` of `owner` without arguments: a callable field
    /// first, then a native method of its type.
    pub(crate) fn invoke_method(&self, owner: ObjectRef, name: &str) -> Result<(), Error> {
        let field = self.heap.borrow().field(owner, name).cloned();
        if let Some(Value::Object(function)) = field {
            let callable = matches!(self.heap.borrow().get(function), Some(Object::Callable(_)));
            if callable {
                self.call(function, Some(owner), &[])?;
                return Ok(());
            }
        }

        let type_name = self
            .heap
            .borrow()
            .type_name(owner)
            .map(String::from)
            .ok_or(Error::MissingObject(owner))?;
        let method = self
            .registry
            .get_meta(&type_name)
            .and_then(|meta| meta.method(name))
            .cloned()
            .ok_or_else(|| Error::MissingMethod {
                type_name: type_name.clone(),
                method: String::from(name),
            })?;
        method(&mut *self.heap.borrow_mut(), owner, &[])?;
        Ok(())
    }
}

struct RegistryHost<'r>(&'r TypeRegistry);

impl MethodHost for RegistryHost<'_> {
    fn method(&self, type_name: &str, name: &str) -> Option<NativeMethod> {
        self.0.get_meta(type_name)?.method(name).cloned()
    }
}

/// Sets a flag for its lifetime, also on early return and unwinding.
struct FlagGuard<'a>(&'a Cell<bool>);

impl<'a> FlagGuard<'a> {
    #[inline]
    fn raise(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for FlagGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// -----------------------------------------------------------------------------
// ContextBuilder

/// Configures a [`Context`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use og_serde::{Context, TypeRegistry};
/// use og_task::CancelToken;
///
/// let registry = TypeRegistry::new();
/// let token = CancelToken::new();
/// let cx = Context::builder(&registry)
///     .allow_callables(true)
///     .progress_interval(Duration::ZERO)
///     .cancel_token(token.clone())
///     .on_progress(|processed, total, _| println!("{processed}/{total}"))
///     .build();
///
/// assert!(cx.allows_callables());
/// token.cancel();
/// assert!(cx.checkpoint().is_err());
/// ```
pub struct ContextBuilder<'r> {
    registry: &'r TypeRegistry,
    heap: Heap,
    allow_callables: bool,
    progress_interval: Duration,
    cancel: Option<CancelToken>,
    callbacks: Callbacks,
}

impl<'r> ContextBuilder<'r> {
    fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            heap: Heap::new(),
            allow_callables: false,
            progress_interval: Context::DEFAULT_PROGRESS_INTERVAL,
            cancel: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Heap holding the live graph, e.g. the objects to serialize.
    #[inline]
    pub fn heap(mut self, heap: Heap) -> Self {
        self.heap = heap;
        self
    }

    /// Whether callable nodes are compiled. Off by default.
    #[inline]
    pub fn allow_callables(mut self, allow: bool) -> Self {
        self.allow_callables = allow;
        self
    }

    /// Minimum time between two `on_progress` calls.
    #[inline]
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    #[inline]
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Called with the estimated total and the root node.
    pub fn on_start(mut self, f: impl FnMut(usize, &Node) + 'static) -> Self {
        self.callbacks.on_start = Some(Box::new(f));
        self
    }

    /// Called with `processed`, `total` and the node being processed.
    pub fn on_progress(mut self, f: impl FnMut(usize, usize, &Node) + 'static) -> Self {
        self.callbacks.on_progress = Some(Box::new(f));
        self
    }

    /// Called once a top-level deserialize call succeeded.
    pub fn on_finish(mut self, f: impl FnMut() + 'static) -> Self {
        self.callbacks.on_finish = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Context<'r> {
        Context {
            registry: self.registry,
            heap: RefCell::new(self.heap),
            refs: RefCell::new(RefTable::default()),
            seen: RefCell::new(HashSet::default()),
            progress: RefCell::new(ProgressState {
                processed: 0,
                total: 0,
                throttle: Throttle::new(self.progress_interval),
            }),
            callbacks: RefCell::new(self.callbacks),
            loading: Cell::new(false),
            saving: Cell::new(false),
            allow_callables: self.allow_callables,
            cancel: self.cancel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Context;
    use crate::error::Error;
    use crate::node::Node;
    use crate::registry::TypeRegistry;
    use alloc::rc::Rc;
    use core::cell::RefCell;
    use core::time::Duration;
    use og_graph::{Fields, Value};
    use og_task::CancelToken;

    #[test]
    fn add_and_lookup() {
        let registry = TypeRegistry::new();
        let cx = Context::new(&registry);
        let a = cx.heap_mut().insert(Fields::default());
        let b = cx.heap_mut().insert(Fields::default());

        cx.add(a, "a").unwrap();
        cx.add(a, "a").unwrap();
        assert_eq!(cx.get_from_key("a"), Some(a));
        assert_eq!(cx.id_of(a).as_deref(), Some("a"));
        assert!(matches!(cx.add(b, "a"), Err(Error::DuplicateId { id }) if id == "a"));
        assert_eq!(cx.get_from_key("missing"), None);
    }

    #[test]
    fn assign_id_prefers_free_names() {
        let registry = TypeRegistry::new();
        let cx = Context::new(&registry);
        let mut heap = cx.heap_mut();
        let (a, b, c) = (
            heap.insert(Fields::default()),
            heap.insert(Fields::default()),
            heap.insert(Fields::default()),
        );
        drop(heap);

        cx.add(c, "#0").unwrap();
        assert_eq!(cx.assign_id(a, Some("root")), "root");
        assert_eq!(cx.assign_id(a, Some("other")), "root");
        assert_eq!(cx.assign_id(b, Some("root")), "#1");
        assert_eq!(cx.get_from_key("#1"), Some(b));
    }

    #[test]
    fn progress_is_clamped_and_reported() {
        let registry = TypeRegistry::new();
        let seen = Rc::new(RefCell::new(alloc::vec::Vec::new()));
        let sink = seen.clone();
        let cx = Context::builder(&registry)
            .progress_interval(Duration::ZERO)
            .on_progress(move |processed, total, _| sink.borrow_mut().push((processed, total)))
            .build();

        cx.start(2, &Node::NULL);
        for _ in 0..3 {
            cx.tick(&Node::NULL);
        }
        assert_eq!(*seen.borrow(), [(1, 2), (2, 2), (2, 2)]);
        cx.finish();
        assert_eq!(cx.progress().processed, 2);
    }

    #[test]
    fn checkpoint_observes_cancellation() {
        let registry = TypeRegistry::new();
        let token = CancelToken::new();
        let cx = Context::builder(&registry).cancel_token(token.clone()).build();
        assert!(cx.checkpoint().is_ok());
        token.cancel();
        assert!(matches!(cx.checkpoint(), Err(Error::Cancelled(_))));
    }

    #[test]
    fn nested_call_is_not_a_new_session() {
        let registry = TypeRegistry::new();
        let starts = Rc::new(RefCell::new(0));
        let counter = starts.clone();
        let cx = Context::builder(&registry)
            .on_start(move |_, _| *counter.borrow_mut() += 1)
            .build();

        cx.loading.set(true);
        let value = og_task::block_on(cx.deserialize(&Node::from(1.0))).unwrap();
        cx.loading.set(false);
        assert_eq!(value, Value::Number(1.0));
        assert_eq!(*starts.borrow(), 0);

        og_task::block_on(cx.deserialize(&Node::from(1.0))).unwrap();
        assert_eq!(*starts.borrow(), 1);
        assert!(!cx.is_loading());
    }
}
