//! Tree-walking interpreter for callables.
//!
//! A run sees only its arguments, `this`, local bindings, the `Math` builtins
//! and the heap. Native behavior is reachable only through a [`MethodHost`].

use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;

use og_script::Program;
use og_script::ast::{BinaryOp, Expr, Literal, LogicalOp, Stmt, UnaryOp};

use crate::error::EvalError;
use crate::heap::{Heap, ObjectRef};
use crate::object::{Array, Object};
use crate::value::Value;

/// A native method: receives the heap, the receiver and the arguments.
pub type NativeMethod = Arc<dyn Fn(&mut Heap, ObjectRef, &[Value]) -> Result<Value, EvalError>>;

/// Resolves `receiver.name(..)` calls that no callable field answers.
pub trait MethodHost {
    fn method(&self, type_name: &str, name: &str) -> Option<NativeMethod>;
}

/// A host without native methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMethods;

impl MethodHost for NoMethods {
    #[inline]
    fn method(&self, _type_name: &str, _name: &str) -> Option<NativeMethod> {
        None
    }
}

// -----------------------------------------------------------------------------
// Interpreter

/// Runs callables stored in a [`Heap`].
///
/// # Examples
///
/// ```
/// use og_graph::{Callable, Heap, Interpreter, NoMethods, Value};
///
/// let mut heap = Heap::new();
/// let product = heap.insert(Callable::new(
///     vec!["a".into(), "b".into()],
///     "return a * b;",
/// ));
///
/// let mut interpreter = Interpreter::new(&mut heap, &NoMethods);
/// let result = interpreter.call(product, None, &[Value::from(3), Value::from(4)]);
/// assert_eq!(result, Ok(Value::Number(12.0)));
/// ```
pub struct Interpreter<'a> {
    heap: &'a mut Heap,
    host: &'a dyn MethodHost,
    steps: usize,
    step_limit: usize,
    depth: usize,
    depth_limit: usize,
    item_limit: usize,
    string_limit: usize,
}

impl<'a> Interpreter<'a> {
    pub const DEFAULT_STEP_LIMIT: usize = 100_000;
    pub const DEFAULT_DEPTH_LIMIT: usize = 64;
    pub const DEFAULT_ITEM_LIMIT: usize = 1 << 16;
    pub const DEFAULT_STRING_LIMIT: usize = 1 << 20;

    pub fn new(heap: &'a mut Heap, host: &'a dyn MethodHost) -> Self {
        Self {
            heap,
            host,
            steps: 0,
            step_limit: Self::DEFAULT_STEP_LIMIT,
            depth: 0,
            depth_limit: Self::DEFAULT_DEPTH_LIMIT,
            item_limit: Self::DEFAULT_ITEM_LIMIT,
            string_limit: Self::DEFAULT_STRING_LIMIT,
        }
    }

    /// Total number of statements and expressions one interpreter may evaluate.
    #[inline]
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    #[inline]
    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = limit;
        self
    }

    /// Largest array length a callable may grow an array to.
    #[inline]
    pub fn with_item_limit(mut self, limit: usize) -> Self {
        self.item_limit = limit;
        self
    }

    /// Largest string, in bytes, that `+` may produce.
    #[inline]
    pub fn with_string_limit(mut self, limit: usize) -> Self {
        self.string_limit = limit;
        self
    }

    /// Steps consumed so far.
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Calls the callable stored at `callable`, compiling it if needed.
    pub fn call(
        &mut self,
        callable: ObjectRef,
        this: Option<ObjectRef>,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        let program = match self.heap.get_mut(callable) {
            Some(Object::Callable(callable)) => callable.compile()?,
            Some(other) => return Err(EvalError::NotCallable(String::from(other.type_name()))),
            None => return Err(EvalError::UnknownObject(callable)),
        };
        self.run(&program, this, args)
    }

    /// Runs a program. Missing arguments are `null`, extra ones are ignored.
    pub fn run(
        &mut self,
        program: &Program,
        this: Option<ObjectRef>,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        if self.depth >= self.depth_limit {
            return Err(EvalError::DepthLimit(self.depth_limit));
        }
        self.depth += 1;
        let mut frame = Frame::new(this, program.params(), args);
        let flow = self.exec_block(program.body(), &mut frame);
        self.depth -= 1;

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
        }
    }

    #[inline]
    fn step(&mut self) -> Result<(), EvalError> {
        self.steps += 1;
        if self.steps > self.step_limit {
            return Err(EvalError::StepLimit(self.step_limit));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Statements

    fn exec_block(&mut self, body: &[Stmt], frame: &mut Frame) -> Result<Flow, EvalError> {
        for stmt in body {
            if let Flow::Return(value) = self.exec(stmt, frame)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, frame: &mut Frame) -> Result<Flow, EvalError> {
        self.step()?;
        match stmt {
            Stmt::Let { name, init } => {
                let value = match init {
                    Some(init) => self.eval(init, frame)?,
                    None => Value::Null,
                };
                frame.declare(name, value);
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval(expr, frame)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, frame)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond, frame)?.is_truthy() {
                    self.exec(then, frame)
                } else if let Some(otherwise) = otherwise {
                    self.exec(otherwise, frame)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body } => {
                while self.eval(cond, frame)?.is_truthy() {
                    if let Flow::Return(value) = self.exec(body, frame)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Block(body) => {
                frame.scopes.push(Vec::new());
                let flow = self.exec_block(body, frame);
                frame.scopes.pop();
                flow
            }
            Stmt::Empty => Ok(Flow::Normal),
        }
    }

    // -------------------------------------------------------------------------
    // Expressions

    fn eval(&mut self, expr: &Expr, frame: &mut Frame) -> Result<Value, EvalError> {
        self.step()?;
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Number(value) => Value::Number(*value),
                Literal::String(value) => Value::String(value.clone()),
                Literal::Bool(value) => Value::Bool(*value),
                Literal::Null => Value::Null,
            }),
            Expr::Ident(name) => variable(name, frame),
            Expr::This => Ok(frame.this.map_or(Value::Null, Value::Object)),
            Expr::Array(items) => {
                let items = self.eval_list(items, frame)?;
                Ok(Value::Object(self.heap.insert(Array::new(items))))
            }
            Expr::Member { object, name } => {
                if is_math(object, frame) {
                    return Ok(math_constant(name));
                }
                let target = self.eval(object, frame)?;
                self.property(&target, name)
            }
            Expr::Index { object, index } => {
                let target = self.eval(object, frame)?;
                let index = self.eval(index, frame)?;
                self.index(&target, &index)
            }
            Expr::Call { callee, args } => self.call_expr(callee, args, frame),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, frame)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                })
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, frame)?;
                let right = self.eval(right, frame)?;
                self.binary(*op, &left, &right)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left, frame)?;
                let done = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::Coalesce => !left.is_null(),
                };
                if done { Ok(left) } else { self.eval(right, frame) }
            }
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond, frame)?.is_truthy() {
                    self.eval(then, frame)
                } else {
                    self.eval(otherwise, frame)
                }
            }
            Expr::Assign { op, target, value } => {
                let place = self.place(target, frame)?;
                let value = match op {
                    None => self.eval(value, frame)?,
                    Some(op) => {
                        let current = self.read(&place, frame)?;
                        let rhs = self.eval(value, frame)?;
                        self.binary(*op, &current, &rhs)?
                    }
                };
                self.write(place, value.clone(), frame)?;
                Ok(value)
            }
        }
    }

    fn eval_list(&mut self, exprs: &[Expr], frame: &mut Frame) -> Result<Vec<Value>, EvalError> {
        exprs.iter().map(|expr| self.eval(expr, frame)).collect()
    }

    fn binary(&self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
        let numbers = || (left.to_number(), right.to_number());
        Ok(match op {
            BinaryOp::Add => {
                let text = matches!(left, Value::String(_) | Value::Object(_))
                    || matches!(right, Value::String(_) | Value::Object(_));
                if text {
                    let mut out = self.display(left);
                    out.push_str(&self.display(right));
                    if out.len() > self.string_limit {
                        return Err(EvalError::StringLimit(self.string_limit));
                    }
                    Value::String(out)
                } else {
                    let (l, r) = numbers();
                    Value::Number(l + r)
                }
            }
            BinaryOp::Sub => Value::Number(numbers().0 - numbers().1),
            BinaryOp::Mul => Value::Number(numbers().0 * numbers().1),
            BinaryOp::Div => Value::Number(numbers().0 / numbers().1),
            BinaryOp::Rem => Value::Number(numbers().0 % numbers().1),
            BinaryOp::Pow => Value::Number(libm::pow(numbers().0, numbers().1)),
            BinaryOp::Eq => Value::Bool(left == right),
            BinaryOp::Ne => Value::Bool(left != right),
            BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
            BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
            BinaryOp::Le => Value::Bool(matches!(
                compare(left, right),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinaryOp::Ge => Value::Bool(matches!(
                compare(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            )),
        })
    }

    /// String conversion used by `+`.
    fn display(&self, value: &Value) -> String {
        let Value::Object(object) = value else {
            return value.to_string();
        };
        match self.heap.get(*object) {
            Some(Object::Array(array)) => {
                let parts: Vec<String> = array
                    .items
                    .iter()
                    .map(|item| match item {
                        Value::Null => String::new(),
                        Value::Object(_) => String::from("[object Object]"),
                        other => other.to_string(),
                    })
                    .collect();
                parts.join(",")
            }
            Some(Object::Callable(_)) => String::from("function"),
            _ => String::from("[object Object]"),
        }
    }

    // -------------------------------------------------------------------------
    // Property access

    fn property(&self, target: &Value, name: &str) -> Result<Value, EvalError> {
        match target {
            Value::Null => Err(EvalError::TypeError(format!(
                "cannot read `{name}` of null"
            ))),
            Value::String(text) if name == "length" => Ok(Value::from(text.chars().count() as f64)),
            Value::Object(object) => {
                let object = self
                    .heap
                    .get(*object)
                    .ok_or(EvalError::UnknownObject(*object))?;
                if let Some(value) = object.fields().and_then(|fields| fields.get(name)) {
                    return Ok(value.clone());
                }
                if name == "length" {
                    if let Some(items) = object.items() {
                        return Ok(Value::from(items.len() as f64));
                    }
                    if let Some(callable) = object.as_callable() {
                        return Ok(Value::from(callable.params().len() as f64));
                    }
                }
                Ok(Value::Null)
            }
            _ => Ok(Value::Null),
        }
    }

    fn index(&self, target: &Value, index: &Value) -> Result<Value, EvalError> {
        if let Some(position) = array_index(index) {
            match target {
                Value::Object(object) => {
                    if let Some(items) = self.heap.items(*object) {
                        return Ok(items.get(position).cloned().unwrap_or_default());
                    }
                }
                Value::String(text) => {
                    return Ok(text
                        .chars()
                        .nth(position)
                        .map_or(Value::Null, |c| Value::String(c.to_string())));
                }
                _ => {}
            }
        }
        self.property(target, &self.display(index))
    }

    fn place(&mut self, target: &Expr, frame: &mut Frame) -> Result<Place, EvalError> {
        match target {
            Expr::Ident(name) if frame.lookup(name).is_some() => Ok(Place::Var(name.clone())),
            Expr::Ident(name) => Err(EvalError::UndefinedVariable(name.clone())),
            Expr::Member { object, name } => match self.eval(object, frame)? {
                Value::Object(object) => Ok(Place::Field(object, name.clone())),
                other => Err(EvalError::TypeError(format!(
                    "cannot set `{name}` of {}",
                    self.display(&other)
                ))),
            },
            Expr::Index { object, index } => {
                let target = self.eval(object, frame)?;
                let index = self.eval(index, frame)?;
                let Value::Object(object) = target else {
                    return Err(EvalError::TypeError(format!(
                        "cannot index into {}",
                        self.display(&target)
                    )));
                };
                match array_index(&index) {
                    Some(position) if self.heap.items(object).is_some() => {
                        Ok(Place::Item(object, position))
                    }
                    _ => Ok(Place::Field(object, self.display(&index))),
                }
            }
            _ => Err(EvalError::TypeError(String::from("invalid assignment target"))),
        }
    }

    fn read(&self, place: &Place, frame: &Frame) -> Result<Value, EvalError> {
        match place {
            Place::Var(name) => variable(name, frame),
            Place::Field(object, name) => self.property(&Value::Object(*object), name),
            Place::Item(object, position) => Ok(self
                .heap
                .items(*object)
                .and_then(|items| items.get(*position))
                .cloned()
                .unwrap_or_default()),
        }
    }

    fn write(&mut self, place: Place, value: Value, frame: &mut Frame) -> Result<(), EvalError> {
        match place {
            Place::Var(name) => match frame.lookup_mut(&name) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(EvalError::UndefinedVariable(name)),
            },
            Place::Field(object, name) => self.heap.set_field(object, name, value),
            Place::Item(_, position) if position >= self.item_limit => {
                Err(EvalError::ItemLimit(self.item_limit))
            }
            Place::Item(object, position) => self.heap.set_item(object, position, value),
        }
    }

    // -------------------------------------------------------------------------
    // Calls

    fn call_expr(&mut self, callee: &Expr, args: &[Expr], frame: &mut Frame) -> Result<Value, EvalError> {
        match callee {
            Expr::Member { object, name } if is_math(object, frame) => {
                let args = self.eval_list(args, frame)?;
                math_function(name, &args)
            }
            Expr::Member { object, name } => {
                let receiver = self.eval(object, frame)?;
                let args = self.eval_list(args, frame)?;
                self.call_method(&receiver, name, &args)
            }
            other => {
                let function = self.eval(other, frame)?;
                let args = self.eval_list(args, frame)?;
                match function {
                    Value::Object(object) if self.is_callable(object) => self.call(object, None, &args),
                    other => Err(EvalError::NotCallable(self.display(&other))),
                }
            }
        }
    }

    /// `receiver.name(args)`: a callable field first, then array `push`, then the host.
    fn call_method(&mut self, receiver: &Value, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let Value::Object(object) = receiver else {
            return Err(EvalError::NotCallable(format!("{}.{name}", self.display(receiver))));
        };
        let object = *object;

        match self.heap.field(object, name).cloned() {
            Some(Value::Object(function)) if self.is_callable(function) => {
                return self.call(function, Some(object), args);
            }
            Some(Value::Null) | None => {}
            Some(_) => return Err(EvalError::NotCallable(String::from(name))),
        }

        if name == "push" && self.heap.items(object).is_some() {
            let mut len = 0;
            for value in args {
                len = self.heap.items(object).map_or(0, <[Value]>::len);
                if len >= self.item_limit {
                    return Err(EvalError::ItemLimit(self.item_limit));
                }
                self.heap.set_item(object, len, value.clone())?;
                len += 1;
            }
            return Ok(Value::from(len as f64));
        }

        let type_name = self
            .heap
            .type_name(object)
            .map(String::from)
            .ok_or(EvalError::UnknownObject(object))?;
        match self.host.method(&type_name, name) {
            Some(method) => method(self.heap, object, args),
            None => Err(EvalError::NotCallable(format!("{type_name}.{name}"))),
        }
    }

    #[inline]
    fn is_callable(&self, object: ObjectRef) -> bool {
        matches!(self.heap.get(object), Some(Object::Callable(_)))
    }
}

// -----------------------------------------------------------------------------
// Frames

enum Flow {
    Normal,
    Return(Value),
}

/// An assignable location.
enum Place {
    Var(String),
    Field(ObjectRef, String),
    Item(ObjectRef, usize),
}

struct Frame {
    this: Option<ObjectRef>,
    scopes: Vec<Vec<(String, Value)>>,
}

impl Frame {
    fn new(this: Option<ObjectRef>, params: &[String], args: &[Value]) -> Self {
        let arguments: Vec<(String, Value)> = params
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), args.get(i).cloned().unwrap_or_default()))
            .collect();
        Self {
            this,
            scopes: alloc::vec![arguments],
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.scopes
            .iter_mut()
            .rev()
            .flat_map(|scope| scope.iter_mut().rev())
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    /// Binds `name` in the innermost scope, replacing a binding of the same scope.
    fn declare(&mut self, name: &str, value: Value) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        match scope.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => scope.push((String::from(name), value)),
        }
    }
}

fn variable(name: &str, frame: &Frame) -> Result<Value, EvalError> {
    if let Some(value) = frame.lookup(name) {
        return Ok(value.clone());
    }
    match name {
        "NaN" => Ok(Value::Number(f64::NAN)),
        "Infinity" => Ok(Value::Number(f64::INFINITY)),
        "Math" => Err(EvalError::TypeError(String::from("`Math` is not a value"))),
        _ => Err(EvalError::UndefinedVariable(String::from(name))),
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

fn array_index(index: &Value) -> Option<usize> {
    match index {
        Value::Number(n) if *n >= 0.0 && libm::trunc(*n) == *n && *n <= u32::MAX as f64 => Some(*n as usize),
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// Math

/// `Math` resolves to the builtin only while no local binding shadows it.
fn is_math(expr: &Expr, frame: &Frame) -> bool {
    matches!(expr, Expr::Ident(name) if name == "Math" && frame.lookup(name).is_none())
}

fn math_constant(name: &str) -> Value {
    use core::f64::consts;
    match name {
        "PI" => Value::Number(consts::PI),
        "E" => Value::Number(consts::E),
        "LN2" => Value::Number(consts::LN_2),
        "LN10" => Value::Number(consts::LN_10),
        "SQRT2" => Value::Number(consts::SQRT_2),
        _ => Value::Null,
    }
}

fn math_function(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let arg = |i: usize| args.get(i).map_or(f64::NAN, Value::to_number);
    let x = arg(0);
    let result = match name {
        "abs" => libm::fabs(x),
        "floor" => libm::floor(x),
        "ceil" => libm::ceil(x),
        "round" => libm::floor(x + 0.5),
        "trunc" => libm::trunc(x),
        "sqrt" => libm::sqrt(x),
        "sign" if x == 0.0 || x.is_nan() => x,
        "sign" => libm::copysign(1.0, x),
        "pow" => libm::pow(x, arg(1)),
        "exp" => libm::exp(x),
        "log" => libm::log(x),
        "sin" => libm::sin(x),
        "cos" => libm::cos(x),
        "tan" => libm::tan(x),
        "min" => extremum(args, f64::INFINITY, f64::min),
        "max" => extremum(args, f64::NEG_INFINITY, f64::max),
        _ => return Err(EvalError::NotCallable(format!("Math.{name}"))),
    };
    Ok(Value::Number(result))
}

fn extremum(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    args.iter().map(Value::to_number).fold(init, |acc, value| {
        if acc.is_nan() || value.is_nan() {
            f64::NAN
        } else {
            pick(acc, value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{Interpreter, MethodHost, NativeMethod, NoMethods};
    use crate::error::EvalError;
    use crate::heap::{Heap, ObjectRef};
    use crate::object::{Callable, Instance};
    use crate::value::Value;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    fn callable(heap: &mut Heap, params: &[&str], body: &str) -> ObjectRef {
        let params: Vec<String> = params.iter().map(|p| String::from(*p)).collect();
        heap.insert(Callable::new(params, body))
    }

    fn run(params: &[&str], body: &str, args: &[Value]) -> Result<Value, EvalError> {
        let mut heap = Heap::new();
        let function = callable(&mut heap, params, body);
        Interpreter::new(&mut heap, &NoMethods).call(function, None, args)
    }

    #[test]
    fn arithmetic() {
        assert_eq!(
            run(&["a", "b"], "return a * b;", &[Value::from(3), Value::from(4)]),
            Ok(Value::Number(12.0))
        );
        assert_eq!(run(&[], "return 2 ** 3 - 10 % 4;", &[]), Ok(Value::Number(6.0)));
        assert_eq!(run(&["a"], "return a;", &[]), Ok(Value::Null));
    }

    #[test]
    fn strings_and_logic() {
        assert_eq!(
            run(&["n"], "return 'n=' + n;", &[Value::from(3)]),
            Ok(Value::from("n=3"))
        );
        assert_eq!(
            run(&["a"], "return null ?? a || 5;", &[Value::from(0)]),
            Ok(Value::Number(5.0))
        );
        assert_eq!(
            run(&["a"], "return a === '1' ? 'same' : 'different';", &[Value::from(1)]),
            Ok(Value::from("different"))
        );
    }

    #[test]
    fn loops_and_scopes() {
        let body = "let sum = 0; let i = 1; while (i <= n) { let step = i; sum += step; i += 1; } return sum;";
        assert_eq!(run(&["n"], body, &[Value::from(4)]), Ok(Value::Number(10.0)));
        assert_eq!(
            run(&[], "{ let x = 1; } return x;", &[]),
            Err(EvalError::UndefinedVariable(String::from("x")))
        );
        assert_eq!(
            run(&[], "y = 1;", &[]),
            Err(EvalError::UndefinedVariable(String::from("y")))
        );
    }

    #[test]
    fn arrays() {
        let body = "let xs = [1, 2, 3]; xs[4] = 5; xs.push(6); return xs.length + ':' + xs;";
        assert_eq!(run(&[], body, &[]), Ok(Value::from("6:1,2,3,,5,6")));
    }

    #[test]
    fn math() {
        assert_eq!(
            run(&["a"], "return Math.max(a, 2) + Math.floor(2.7) + Math.abs(-1);", &[Value::from(7)]),
            Ok(Value::Number(10.0))
        );
        assert_eq!(
            run(&[], "let Math = 1; return Math;", &[]),
            Ok(Value::Number(1.0))
        );
        assert!(matches!(
            run(&[], "return Math.nope(1);", &[]),
            Err(EvalError::NotCallable(_))
        ));
    }

    #[test]
    fn this_binding() {
        let mut heap = Heap::new();
        let owner = heap.insert(Instance::new("Pair"));
        let function = callable(&mut heap, &["a", "b"], "this.product = a * b;");

        let result = Interpreter::new(&mut heap, &NoMethods).call(
            function,
            Some(owner),
            &[Value::from(3), Value::from(2)],
        );
        assert_eq!(result, Ok(Value::Null));
        assert_eq!(heap.field(owner, "product"), Some(&Value::Number(6.0)));
    }

    #[test]
    fn callable_fields_are_methods() {
        let mut heap = Heap::new();
        let double = callable(&mut heap, &["x"], "return x * this.factor;");
        let owner = heap.insert(
            Instance::new("Scaler")
                .with_field("factor", 2)
                .with_field("double", double),
        );
        let main = callable(&mut heap, &[], "return this.double(5) + 1;");

        let result = Interpreter::new(&mut heap, &NoMethods).call(main, Some(owner), &[]);
        assert_eq!(result, Ok(Value::Number(11.0)));
    }

    struct Counter;

    impl MethodHost for Counter {
        fn method(&self, type_name: &str, name: &str) -> Option<NativeMethod> {
            if type_name != "Counter" || name != "bump" {
                return None;
            }
            Some(Arc::new(|heap: &mut Heap, this: ObjectRef, args: &[Value]| {
                let by = args.first().map_or(1.0, Value::to_number);
                let count = heap.field(this, "count").map_or(0.0, Value::to_number) + by;
                heap.set_field(this, "count", Value::Number(count))?;
                Ok(Value::Number(count))
            }))
        }
    }

    #[test]
    fn native_methods() {
        let mut heap = Heap::new();
        let counter = heap.insert(Instance::new("Counter"));
        let main = callable(&mut heap, &[], "this.bump(); return this.bump(2);");

        let result = Interpreter::new(&mut heap, &Counter).call(main, Some(counter), &[]);
        assert_eq!(result, Ok(Value::Number(3.0)));

        let other = heap.insert(Instance::new("Other"));
        let result = Interpreter::new(&mut heap, &Counter).call(main, Some(other), &[]);
        assert_eq!(result, Err(EvalError::NotCallable(String::from("Other.bump"))));
    }

    #[test]
    fn limits() {
        assert_eq!(
            run(&[], "while (true) {}", &[]),
            Err(EvalError::StepLimit(Interpreter::DEFAULT_STEP_LIMIT))
        );

        let mut heap = Heap::new();
        let recurse = callable(&mut heap, &[], "return this.again();");
        let owner = heap.insert(Instance::new("Loop").with_field("again", recurse));
        let result = Interpreter::new(&mut heap, &NoMethods).call(recurse, Some(owner), &[]);
        assert_eq!(result, Err(EvalError::DepthLimit(Interpreter::DEFAULT_DEPTH_LIMIT)));
    }

    #[test]
    fn sparse_writes_are_bounded() {
        assert_eq!(
            run(&[], "let xs = []; xs[20000000] = 1; return xs.length;", &[]),
            Err(EvalError::ItemLimit(Interpreter::DEFAULT_ITEM_LIMIT))
        );
        assert_eq!(
            run(&[], "let xs = []; xs[9] = 1; return xs.length;", &[]),
            Ok(Value::Number(10.0))
        );

        let mut heap = Heap::new();
        let fill = callable(&mut heap, &[], "let xs = []; while (true) { xs.push(0); }");
        let result = Interpreter::new(&mut heap, &NoMethods)
            .with_item_limit(8)
            .call(fill, None, &[]);
        assert_eq!(result, Err(EvalError::ItemLimit(8)));
    }

    #[test]
    fn string_growth_is_bounded() {
        assert_eq!(
            run(&[], "let s = 'x'; while (true) { s = s + s; }", &[]),
            Err(EvalError::StringLimit(Interpreter::DEFAULT_STRING_LIMIT))
        );

        let mut heap = Heap::new();
        let grow = callable(&mut heap, &[], "let s = 'ab'; s += 'cd'; return s;");
        let result = Interpreter::new(&mut heap, &NoMethods)
            .with_string_limit(3)
            .call(grow, None, &[]);
        assert_eq!(result, Err(EvalError::StringLimit(3)));
    }

    #[test]
    fn errors() {
        assert!(matches!(
            run(&[], "return null.x;", &[]),
            Err(EvalError::TypeError(_))
        ));
        assert!(matches!(run(&[], "return (;", &[]), Err(EvalError::Parse(_))));
    }
}
