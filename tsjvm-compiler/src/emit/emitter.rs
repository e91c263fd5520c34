//! Lowered tree to instruction emission
//!
//! One post-order pass. Operands are emitted in the order the checker
//! fixed, each once; conversions on every edge become explicit
//! instructions. Nothing is reordered or shared between subtrees.

use crate::coercion::{Conversion, OperandKind};
use crate::emit::constant_pool::{ConstantPool, PoolEntry};
use crate::emit::instructions::{CompareOp, Condition, Instruction, Label, PrimitiveConversion};
use crate::options::CompilerOptions;
use crate::typed_ast::{
    ArithmeticOp, ComparisonOp, ConstructionPlan, Constant, LocalRef, LogicalOp, PlanEntryKind,
    PlanKey, TypedExpr, TypedExprKind,
};
use crate::types::{widens_to, PrimitiveKind, StackKind, TypeKind};

const OBJECT_DESCRIPTOR: &str = "Ljava/lang/Object;";
const STRING_CLASS: &str = "java/lang/String";
const MAP_INTERFACE: &str = "java/util/Map";
const ENTRY_INTERFACE: &str = "java/util/Map$Entry";
const SET_INTERFACE: &str = "java/util/Set";
const ITERATOR_INTERFACE: &str = "java/util/Iterator";

/// Instruction buffer for one unit
pub struct Emitter<'a> {
    options: &'a CompilerOptions,
    instructions: Vec<Instruction>,
    pool: ConstantPool,
    next_label: u32,
    /// Next slot free for scratch locals
    next_local: u16,
    max_locals: u16,
}

impl<'a> Emitter<'a> {
    /// `first_scratch` is the first slot not used by declared locals
    pub fn new(options: &'a CompilerOptions, first_scratch: u16) -> Self {
        Self {
            options,
            instructions: Vec::new(),
            pool: ConstantPool::new(),
            next_label: 0,
            next_local: first_scratch,
            max_locals: first_scratch,
        }
    }

    /// Consume the emitter, yielding its buffer, pool and local count
    pub fn finish(self) -> (Vec<Instruction>, ConstantPool, u16) {
        (self.instructions, self.pool, self.max_locals)
    }

    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    fn scratch_local(&mut self) -> u16 {
        let slot = self.next_local;
        self.next_local += 1;
        self.max_locals = self.max_locals.max(self.next_local);
        slot
    }

    fn invoke_static(&mut self, owner: &str, name: &str, descriptor: &str) {
        let index = self.pool.method(owner, name, descriptor);
        self.emit(Instruction::InvokeStatic(index));
    }

    fn invoke_virtual(&mut self, owner: &str, name: &str, descriptor: &str) {
        let index = self.pool.method(owner, name, descriptor);
        self.emit(Instruction::InvokeVirtual(index));
    }

    fn invoke_interface(&mut self, owner: &str, name: &str, descriptor: &str) {
        let index = self.pool.interface_method(owner, name, descriptor);
        self.emit(Instruction::InvokeInterface(index));
    }

    /// Store the value on top of the stack into a local
    pub fn emit_store(&mut self, local: &LocalRef) {
        self.emit(Instruction::Store(local.declared_type.stack_kind(), local.slot));
    }

    /// Internal class name, with record and list containers from the options
    fn class_name(&self, kind: &TypeKind) -> String {
        match kind {
            TypeKind::Record(_) => self.options.container_class.clone(),
            TypeKind::Array(_) => self.options.list_class.clone(),
            other => other.internal_name(),
        }
    }

    pub fn emit_expression(&mut self, expr: &TypedExpr) {
        match &expr.kind {
            TypedExprKind::Constant(constant) => self.emit_constant(constant),
            TypedExprKind::Local(local) => self.emit(Instruction::Load(
                local.declared_type.stack_kind(),
                local.slot,
            )),
            TypedExprKind::Convert {
                operand,
                conversion,
            } => {
                self.emit_expression(operand);
                self.emit_conversion(conversion, &operand.result_type);
            }
            TypedExprKind::Arithmetic {
                op,
                operand,
                left,
                right,
            } => {
                self.emit_expression(left);
                self.emit_expression(right);
                self.emit(Instruction::Arithmetic(*op, operand.stack_kind()));
            }
            TypedExprKind::Power { left, right } => {
                self.emit_expression(left);
                self.emit_expression(right);
                self.invoke_static("java/lang/Math", "pow", "(DD)D");
            }
            TypedExprKind::Negate { operand, value } => {
                self.emit_expression(value);
                self.emit(Instruction::Neg(operand.stack_kind()));
            }
            TypedExprKind::BitwiseNot { operand, value } => {
                self.emit_expression(value);
                let kind = operand.stack_kind();
                match kind {
                    StackKind::Long => self.emit_long(-1),
                    _ => self.emit_int(-1),
                }
                self.emit(Instruction::Arithmetic(ArithmeticOp::Xor, kind));
            }
            TypedExprKind::Not(value) => {
                self.emit_expression(value);
                self.emit_int(1);
                self.emit(Instruction::Arithmetic(ArithmeticOp::Xor, StackKind::Int));
            }
            TypedExprKind::Compare {
                op,
                operand,
                left,
                right,
            } => self.emit_compare(*op, *operand, left, right),
            TypedExprKind::Logical { op, left, right } => self.emit_logical(*op, left, right),
            TypedExprKind::Concat { left, right } => {
                self.emit_expression(left);
                self.emit_expression(right);
                self.invoke_virtual(
                    STRING_CLASS,
                    "concat",
                    "(Ljava/lang/String;)Ljava/lang/String;",
                );
            }
            TypedExprKind::Update {
                local,
                delta,
                prefix,
            } => self.emit_update(local, *delta, *prefix),
            TypedExprKind::Assign { local, value } => {
                self.emit_expression(value);
                match local.declared_type.stack_kind().size() {
                    2 => self.emit(Instruction::Dup2),
                    _ => self.emit(Instruction::Dup),
                }
                self.emit_store(local);
            }
            TypedExprKind::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                let otherwise = self.new_label();
                let end = self.new_label();
                self.emit_expression(condition);
                self.emit(Instruction::If(Condition::Eq, otherwise));
                self.emit_expression(consequent);
                self.emit(Instruction::Goto(end));
                self.emit(Instruction::Label(otherwise));
                self.emit_expression(alternate);
                self.emit(Instruction::Label(end));
            }
            TypedExprKind::Record(plan) => self.emit_plan(plan),
            TypedExprKind::List(elements) => {
                let list_class = self.options.list_class.clone();
                self.emit_new(&list_class);
                for element in elements {
                    self.emit(Instruction::Dup);
                    self.emit_expression(element);
                    self.invoke_virtual(&list_class, "add", "(Ljava/lang/Object;)Z");
                    self.emit(Instruction::Pop);
                }
            }
        }
    }

    /// `new C; dup; invokespecial C.<init>()V`
    fn emit_new(&mut self, class: &str) {
        let index = self.pool.class(class);
        self.emit(Instruction::New(index));
        self.emit(Instruction::Dup);
        let constructor = self.pool.method(class, "<init>", "()V");
        self.emit(Instruction::InvokeSpecial(constructor));
    }

    pub fn emit_constant(&mut self, constant: &Constant) {
        match constant {
            Constant::Int(value) => self.emit_int(*value),
            Constant::Long(value) => self.emit_long(*value),
            Constant::Float(value) => {
                if (*value == 0.0 && value.is_sign_positive()) || *value == 1.0 || *value == 2.0 {
                    self.emit(Instruction::FConst(*value));
                } else {
                    let index = self.pool.add(PoolEntry::Float(value.to_bits()));
                    self.emit(Instruction::Ldc(index));
                }
            }
            Constant::Double(value) => {
                if (*value == 0.0 && value.is_sign_positive()) || *value == 1.0 {
                    self.emit(Instruction::DConst(*value));
                } else {
                    let index = self.pool.add(PoolEntry::Double(value.to_bits()));
                    self.emit(Instruction::Ldc2W(index));
                }
            }
            Constant::Boolean(value) => self.emit_int(i32::from(*value)),
            Constant::String(value) => {
                let index = self.pool.string(value);
                self.emit(Instruction::Ldc(index));
            }
            Constant::Null => self.emit(Instruction::AConstNull),
        }
    }

    fn emit_int(&mut self, value: i32) {
        let instruction = if (-1..=5).contains(&value) {
            Instruction::IConst(value)
        } else if let Ok(byte) = i8::try_from(value) {
            Instruction::BiPush(byte)
        } else if let Ok(short) = i16::try_from(value) {
            Instruction::SiPush(short)
        } else {
            Instruction::Ldc(self.pool.add(PoolEntry::Integer(value)))
        };
        self.emit(instruction);
    }

    fn emit_long(&mut self, value: i64) {
        if value == 0 || value == 1 {
            self.emit(Instruction::LConst(value));
        } else {
            let index = self.pool.add(PoolEntry::Long(value));
            self.emit(Instruction::Ldc2W(index));
        }
    }

    /// Push the constant `1` of a numeric kind's stack representation
    fn emit_one(&mut self, kind: StackKind) {
        match kind {
            StackKind::Long => self.emit(Instruction::LConst(1)),
            StackKind::Float => self.emit(Instruction::FConst(1.0)),
            StackKind::Double => self.emit(Instruction::DConst(1.0)),
            _ => self.emit(Instruction::IConst(1)),
        }
    }

    pub fn emit_conversion(&mut self, conversion: &Conversion, from: &TypeKind) {
        match conversion {
            Conversion::Unbox(kind) => self.emit_unbox(*kind),
            Conversion::Box(kind) => self.emit_box(*kind),
            Conversion::Primitive { from, to } => self.emit_primitive_conversion(*from, *to),
            Conversion::NumberValue(kind) => {
                // Number has no char accessor
                let accessor = match kind {
                    PrimitiveKind::Char => PrimitiveKind::Int,
                    other => *other,
                };
                let descriptor = format!("(){}", accessor.descriptor());
                self.invoke_virtual("java/lang/Number", &format!("{}Value", accessor.name()), &descriptor);
                if *kind == PrimitiveKind::Char {
                    self.emit(Instruction::Convert(PrimitiveConversion::I2C));
                }
            }
            Conversion::CheckCast(target) => {
                let class = self.class_name(target);
                if class != self.class_name(from) || matches!(from, TypeKind::AnyObject | TypeKind::Null) {
                    let index = self.pool.class(&class);
                    self.emit(Instruction::CheckCast(index));
                }
            }
            Conversion::Stringify => self.invoke_static(
                STRING_CLASS,
                "valueOf",
                "(Ljava/lang/Object;)Ljava/lang/String;",
            ),
        }
    }

    fn emit_box(&mut self, kind: PrimitiveKind) {
        let wrapper = kind.wrapper_class();
        let descriptor = format!("({})L{};", kind.descriptor(), wrapper);
        self.invoke_static(wrapper, "valueOf", &descriptor);
    }

    fn emit_unbox(&mut self, kind: PrimitiveKind) {
        let wrapper = kind.wrapper_class();
        let descriptor = format!("(){}", kind.descriptor());
        self.invoke_virtual(wrapper, &format!("{}Value", kind.name()), &descriptor);
    }

    /// Widening needs at most one opcode; narrowing to byte, short or
    /// char goes through int first
    fn emit_primitive_conversion(&mut self, from: PrimitiveKind, to: PrimitiveKind) {
        if from == to {
            return;
        }
        let (source, target) = (from.stack_kind(), to.stack_kind());
        if let Some(conversion) = PrimitiveConversion::between(source, target) {
            self.emit(Instruction::Convert(conversion));
        }
        let narrow = match to {
            PrimitiveKind::Byte => Some(PrimitiveConversion::I2B),
            PrimitiveKind::Short => Some(PrimitiveConversion::I2S),
            PrimitiveKind::Char => Some(PrimitiveConversion::I2C),
            _ => None,
        };
        if let Some(narrow) = narrow {
            if !widens_to(from, to) {
                self.emit(Instruction::Convert(narrow));
            }
        }
    }

    /// Truncate an int result back to a sub-int declared kind
    fn emit_narrow(&mut self, kind: PrimitiveKind) {
        let narrow = match kind {
            PrimitiveKind::Byte => PrimitiveConversion::I2B,
            PrimitiveKind::Short => PrimitiveConversion::I2S,
            PrimitiveKind::Char => PrimitiveConversion::I2C,
            _ => return,
        };
        self.emit(Instruction::Convert(narrow));
    }

    fn emit_compare(
        &mut self,
        op: ComparisonOp,
        operand: OperandKind,
        left: &TypedExpr,
        right: &TypedExpr,
    ) {
        let when_true = self.new_label();
        let end = self.new_label();
        let condition = Condition::from_comparison(op);

        match operand {
            OperandKind::Reference => {
                self.emit_expression(left);
                self.emit_expression(right);
                self.invoke_static(
                    "java/util/Objects",
                    "equals",
                    "(Ljava/lang/Object;Ljava/lang/Object;)Z",
                );
                if op == ComparisonOp::NotEqual {
                    self.emit_int(1);
                    self.emit(Instruction::Arithmetic(ArithmeticOp::Xor, StackKind::Int));
                }
                return;
            }
            OperandKind::NullCheck => {
                // The null literal side has no effects to preserve
                let checked = if left.result_type.is_null() { right } else { left };
                self.emit_expression(checked);
                match op {
                    ComparisonOp::NotEqual => self.emit(Instruction::IfNonNull(when_true)),
                    _ => self.emit(Instruction::IfNull(when_true)),
                }
            }
            OperandKind::Boolean | OperandKind::Numeric(PrimitiveKind::Int) => {
                self.emit_expression(left);
                self.emit_expression(right);
                self.emit(Instruction::IfICmp(condition, when_true));
            }
            OperandKind::Numeric(kind) => {
                self.emit_expression(left);
                self.emit_expression(right);
                let compare = match (kind.stack_kind(), op) {
                    (StackKind::Long, _) => CompareOp::LCmp,
                    // NaN must make every ordered comparison false
                    (StackKind::Float, ComparisonOp::Less | ComparisonOp::LessEqual) => CompareOp::FCmpG,
                    (StackKind::Float, _) => CompareOp::FCmpL,
                    (StackKind::Double, ComparisonOp::Less | ComparisonOp::LessEqual) => CompareOp::DCmpG,
                    (StackKind::Double, _) => CompareOp::DCmpL,
                    _ => {
                        self.emit(Instruction::IfICmp(condition, when_true));
                        self.emit_branch_result(when_true, end);
                        return;
                    }
                };
                self.emit(Instruction::Compare(compare));
                self.emit(Instruction::If(condition, when_true));
            }
        }
        self.emit_branch_result(when_true, end);
    }

    /// `iconst_0; goto end; when_true: iconst_1; end:`
    fn emit_branch_result(&mut self, when_true: Label, end: Label) {
        self.emit_int(0);
        self.emit(Instruction::Goto(end));
        self.emit(Instruction::Label(when_true));
        self.emit_int(1);
        self.emit(Instruction::Label(end));
    }

    /// The right operand is skipped once the left decides the result
    fn emit_logical(&mut self, op: LogicalOp, left: &TypedExpr, right: &TypedExpr) {
        let decided = self.new_label();
        let end = self.new_label();
        let (branch, decided_value) = match op {
            LogicalOp::And => (Condition::Eq, 0),
            LogicalOp::Or => (Condition::Ne, 1),
        };
        self.emit_expression(left);
        self.emit(Instruction::If(branch, decided));
        self.emit_expression(right);
        self.emit(Instruction::If(branch, decided));
        self.emit_int(1 - decided_value);
        self.emit(Instruction::Goto(end));
        self.emit(Instruction::Label(decided));
        self.emit_int(decided_value);
        self.emit(Instruction::Label(end));
    }

    /// `++`/`--` computed in the variable's declared type. Postfix leaves
    /// the old value on the stack, prefix the new one.
    fn emit_update(&mut self, local: &LocalRef, delta: i8, prefix: bool) {
        let op = if delta > 0 {
            ArithmeticOp::Add
        } else {
            ArithmeticOp::Subtract
        };
        let slot = local.slot;

        match &local.declared_type {
            TypeKind::Primitive(PrimitiveKind::Int) => {
                let increment = Instruction::IInc {
                    slot,
                    delta: i16::from(delta),
                };
                if prefix {
                    self.emit(increment);
                    self.emit(Instruction::Load(StackKind::Int, slot));
                } else {
                    self.emit(Instruction::Load(StackKind::Int, slot));
                    self.emit(increment);
                }
            }
            TypeKind::Primitive(kind) => {
                let kind = *kind;
                let stack = kind.stack_kind();
                let dup = match stack.size() {
                    2 => Instruction::Dup2,
                    _ => Instruction::Dup,
                };
                self.emit(Instruction::Load(stack, slot));
                if !prefix {
                    self.emit(dup.clone());
                }
                self.emit_one(stack);
                self.emit(Instruction::Arithmetic(op, stack));
                self.emit_narrow(kind);
                if prefix {
                    self.emit(dup);
                }
                self.emit(Instruction::Store(stack, slot));
            }
            TypeKind::Boxed(kind) => {
                let kind = *kind;
                let stack = kind.stack_kind();
                self.emit(Instruction::Load(StackKind::Reference, slot));
                if !prefix {
                    self.emit(Instruction::Dup);
                }
                self.emit_unbox(kind);
                self.emit_one(stack);
                self.emit(Instruction::Arithmetic(op, stack));
                self.emit_narrow(kind);
                self.emit_box(kind);
                if prefix {
                    self.emit(Instruction::Dup);
                }
                self.emit(Instruction::Store(StackKind::Reference, slot));
            }
            // Rejected by the checker
            _ => {}
        }
    }

    pub fn emit_plan(&mut self, plan: &ConstructionPlan) {
        let container = self.options.container_class.clone();
        let put_descriptor = format!("({}{}){}", OBJECT_DESCRIPTOR, OBJECT_DESCRIPTOR, OBJECT_DESCRIPTOR);
        self.emit_new(&container);

        for entry in &plan.entries {
            match &entry.kind {
                PlanEntryKind::Insert { key, value, .. } => {
                    self.emit(Instruction::Dup);
                    match key {
                        PlanKey::Constant { value, key_type } => {
                            self.emit_constant(value);
                            if let TypeKind::Boxed(kind) = key_type {
                                self.emit_box(*kind);
                            }
                        }
                        PlanKey::Computed(expr) => self.emit_expression(expr),
                    }
                    self.emit_expression(value);
                    self.invoke_virtual(&container, "put", &put_descriptor);
                    self.emit(Instruction::Pop);
                }
                PlanEntryKind::Spread { source, .. } => {
                    self.emit_spread(source, &container, &put_descriptor);
                }
            }
        }
    }

    /// Iterate the source's entry set, putting each entry into the
    /// container below it on the stack
    fn emit_spread(&mut self, source: &TypedExpr, container: &str, put_descriptor: &str) {
        let iterator = self.scratch_local();
        let head = self.new_label();
        let done = self.new_label();

        self.emit_expression(source);
        if !matches!(source.result_type, TypeKind::Record(_)) {
            let index = self.pool.class(MAP_INTERFACE);
            self.emit(Instruction::CheckCast(index));
        }
        self.invoke_interface(MAP_INTERFACE, "entrySet", "()Ljava/util/Set;");
        self.invoke_interface(SET_INTERFACE, "iterator", "()Ljava/util/Iterator;");
        self.emit(Instruction::Store(StackKind::Reference, iterator));

        self.emit(Instruction::Label(head));
        self.emit(Instruction::Load(StackKind::Reference, iterator));
        self.invoke_interface(ITERATOR_INTERFACE, "hasNext", "()Z");
        self.emit(Instruction::If(Condition::Eq, done));
        self.emit(Instruction::Dup);
        self.emit(Instruction::Load(StackKind::Reference, iterator));
        self.invoke_interface(ITERATOR_INTERFACE, "next", "()Ljava/lang/Object;");
        let entry_class = self.pool.class(ENTRY_INTERFACE);
        self.emit(Instruction::CheckCast(entry_class));
        self.emit(Instruction::Dup);
        self.invoke_interface(ENTRY_INTERFACE, "getKey", "()Ljava/lang/Object;");
        self.emit(Instruction::Swap);
        self.invoke_interface(ENTRY_INTERFACE, "getValue", "()Ljava/lang/Object;");
        self.invoke_virtual(container, "put", put_descriptor);
        self.emit(Instruction::Pop);
        self.emit(Instruction::Goto(head));
        self.emit(Instruction::Label(done));
    }
}
