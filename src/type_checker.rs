use crate::{
    ast::{
        BinaryExpression, BinaryOperator, Expr, Function, Ident, Node, Parameter, Program, Stmt,
        UnaryExpression, UnaryOperator, VariableAccess, VariableAssignment,
        VariableCaptureAccess, VariableDeclaration,
    },
    token::Spanned,
    types::{DataType, Scope},
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Result type of every valid `<left> <op> <right>` combination.
static OPERATIONS: phf::Map<&'static str, DataType> = phf::phf_map! {
    "int + int" => DataType::Integer,
    "int + float" => DataType::Float,
    "float + int" => DataType::Float,
    "float + float" => DataType::Float,
    "string + string" => DataType::String,
    "int - int" => DataType::Integer,
    "int - float" => DataType::Float,
    "float - int" => DataType::Float,
    "float - float" => DataType::Float,
    "int * int" => DataType::Integer,
    "int * float" => DataType::Float,
    "float * int" => DataType::Float,
    "float * float" => DataType::Float,
    "int / int" => DataType::Integer,
    "int / float" => DataType::Float,
    "float / int" => DataType::Float,
    "float / float" => DataType::Float,
    "int % int" => DataType::Integer,
    "int % float" => DataType::Float,
    "float % int" => DataType::Float,
    "float % float" => DataType::Float,
    "int == int" => DataType::Bool,
    "int == float" => DataType::Bool,
    "float == int" => DataType::Bool,
    "float == float" => DataType::Bool,
    "string == string" => DataType::Bool,
    "bool == bool" => DataType::Bool,
    "int != int" => DataType::Bool,
    "int != float" => DataType::Bool,
    "float != int" => DataType::Bool,
    "float != float" => DataType::Bool,
    "string != string" => DataType::Bool,
    "bool != bool" => DataType::Bool,
    "int < int" => DataType::Bool,
    "int < float" => DataType::Bool,
    "float < int" => DataType::Bool,
    "float < float" => DataType::Bool,
    "int > int" => DataType::Bool,
    "int > float" => DataType::Bool,
    "float > int" => DataType::Bool,
    "float > float" => DataType::Bool,
    "int <= int" => DataType::Bool,
    "int <= float" => DataType::Bool,
    "float <= int" => DataType::Bool,
    "float <= float" => DataType::Bool,
    "int >= int" => DataType::Bool,
    "int >= float" => DataType::Bool,
    "float >= int" => DataType::Bool,
    "float >= float" => DataType::Bool,
    "bool and bool" => DataType::Bool,
    "bool or bool" => DataType::Bool,
};

/// Validates programs against a global scope seeded with the built-ins.
///
/// The global scope lives as long as the checker, so declarations made by one
/// [`Checker::check`] call are visible to the next.
pub struct Checker {
    global: Scope<'static>,
}

impl Default for Checker {
    fn default() -> Self {
        Checker::new()
    }
}

impl Checker {
    pub fn new() -> Checker {
        Checker {
            global: Scope::global(),
        }
    }

    pub fn global(&self) -> &Scope<'static> {
        &self.global
    }

    /// Checks `body` in `scope`, or in the global scope when `None`.
    /// `expected` is the return type of the enclosing function, if any.
    ///
    /// Returns whether `body` contains a return statement, either directly or
    /// inside an `if` branch. Stops at the first error.
    pub fn check(
        &mut self,
        body: &mut [Node],
        scope: Option<&mut Scope<'_>>,
        expected: Option<&DataType>,
    ) -> Result<bool> {
        match scope {
            Some(scope) => check_body(body, scope, expected),
            None => check_body(body, &mut self.global, expected),
        }
    }

    pub fn check_program(&mut self, program: &mut Program) -> Result<()> {
        self.check(&mut program.body, None, None)?;
        log::debug!(
            "checked {} top-level nodes, {} globals declared",
            program.body.len(),
            self.global.names().count()
        );
        Ok(())
    }

    /// Lists the names `body` uses without declaring, as seen from the
    /// global scope.
    pub fn free_variables(&self, body: &[Node]) -> Vec<(Ident, Option<DataType>)> {
        free_variables(body, &self.global)
    }
}

fn check_body(
    body: &mut [Node],
    scope: &mut Scope<'_>,
    expected: Option<&DataType>,
) -> Result<bool> {
    let mut found_return = false;
    for node in body {
        match node {
            Node::Stmt(Stmt::VariableDeclaration(decl)) => check_declaration(decl, scope)?,
            Node::Stmt(Stmt::Return(stmt)) => {
                found_return = true;
                let Some(expected) = expected else {
                    return Err(stmt.pos.wrap(Error::ReturnOutsideFunction));
                };
                let found = match stmt.value {
                    Some(ref mut value) => infer_type(value, scope)?,
                    None => DataType::Void,
                };
                if !found.similar(expected) {
                    let error = Error::ReturnMismatch {
                        found,
                        expected: expected.clone(),
                    };
                    return Err(stmt.pos.wrap(error));
                }
            }
            // Both branches share the enclosing scope.
            Node::Stmt(Stmt::If(stmt)) => {
                resolve_captures(&mut stmt.condition, scope)?;
                let then_returns = check_body(&mut stmt.then_body, scope, expected)?;
                let else_returns = check_body(&mut stmt.else_body, scope, expected)?;
                found_return |= then_returns || else_returns;
            }
            Node::Expr(Expr::Assignment(assignment)) => check_assignment(assignment, scope)?,
            Node::Expr(expr) => resolve_captures(expr, scope)?,
        }
    }
    Ok(found_return)
}

fn check_declaration(decl: &mut VariableDeclaration, scope: &mut Scope<'_>) -> Result<()> {
    if let Err(existing) = scope.declare(&decl.name, decl.ty.clone()) {
        let error = Error::Redeclaration {
            name: decl.name.clone(),
            existing,
        };
        return Err(decl.pos.wrap(error));
    }
    log::trace!("declared {}: {}", decl.name, decl.ty);

    match decl.initializer {
        Expr::Function(ref mut function) => {
            if let Some(ref signature) = decl.signature {
                check_signature(signature, function)?;
            }
            check_function(function, &decl.ty, scope)
        }
        Expr::Access(ref mut access) => check_reference(access, &decl.ty, scope),
        _ => Err(decl.pos.wrap(Error::InvalidInitializer(decl.name.clone()))),
    }
}

fn check_signature(signature: &[Parameter], function: &Function) -> Result<()> {
    let matches = signature.len() == function.params.len()
        && signature
            .iter()
            .zip(&function.params)
            .all(|(declared, actual)| declared.ty.similar(&actual.ty));
    if matches {
        Ok(())
    } else {
        let error = Error::SignatureMismatch {
            expected: format_params(signature),
            found: format_params(&function.params),
        };
        Err(function.pos.wrap(error))
    }
}

/// Checks a function value bound to something of type `expected`.
///
/// The body is checked in a fresh scope holding the parameters, after which
/// the function's own capture list is annotated.
fn check_function(function: &mut Function, expected: &DataType, scope: &Scope<'_>) -> Result<()> {
    if !function.return_type.similar(expected) {
        let error = Error::FunctionTypeMismatch {
            found: function.return_type.clone(),
            expected: expected.clone(),
        };
        return Err(function.pos.wrap(error));
    }

    let mut inner = scope.child();
    for param in &function.params {
        if let Err(existing) = inner.declare(&param.name, param.ty.clone()) {
            let error = Error::Redeclaration {
                name: param.name.clone(),
                existing,
            };
            return Err(function.pos.wrap(error));
        }
    }

    let returns = check_body(&mut function.body, &mut inner, Some(&function.return_type))?;
    if !returns && function.return_type != DataType::Void {
        let error = Error::MissingReturn(function.return_type.clone());
        return Err(function.pos.wrap(error));
    }

    // Copy each capture as it was resolved at its point of use, since a later
    // declaration in the body may shadow the captured name.
    let mut captures = Vec::with_capacity(function.captures.len());
    collect_captures_in_body(&function.body, &mut captures);
    function.captures = captures;
    Ok(())
}

/// Collects the captures written directly in `body`, in source order. Nested
/// function literals keep their own.
fn collect_captures_in_body(body: &[Node], captures: &mut Vec<VariableCaptureAccess>) {
    for node in body {
        match node {
            Node::Stmt(Stmt::VariableDeclaration(decl)) => {
                collect_captures_in_expr(&decl.initializer, captures);
            }
            Node::Stmt(Stmt::If(stmt)) => {
                collect_captures_in_expr(&stmt.condition, captures);
                collect_captures_in_body(&stmt.then_body, captures);
                collect_captures_in_body(&stmt.else_body, captures);
            }
            Node::Stmt(Stmt::Return(stmt)) => {
                if let Some(ref value) = stmt.value {
                    collect_captures_in_expr(value, captures);
                }
            }
            Node::Expr(expr) => collect_captures_in_expr(expr, captures),
        }
    }
}

fn collect_captures_in_expr(expr: &Expr, captures: &mut Vec<VariableCaptureAccess>) {
    match expr {
        Expr::Integer(_)
        | Expr::Float(_)
        | Expr::String(_)
        | Expr::Boolean(_)
        | Expr::Function(_) => {}
        Expr::Access(access) => {
            for arg in &access.args {
                collect_captures_in_expr(arg, captures);
            }
        }
        // Arguments are parsed, and so registered, before the capture itself.
        Expr::Capture(capture) => {
            for arg in &capture.access.args {
                collect_captures_in_expr(arg, captures);
            }
            captures.push(capture.clone());
        }
        Expr::List(list) => {
            for element in &list.elements {
                collect_captures_in_expr(element, captures);
            }
        }
        Expr::Assignment(assignment) => collect_captures_in_expr(&assignment.value, captures),
        Expr::Binary(binary) => {
            collect_captures_in_expr(&binary.left, captures);
            collect_captures_in_expr(&binary.right, captures);
        }
        Expr::Unary(unary) => collect_captures_in_expr(&unary.operand, captures),
    }
}

/// A bare reference must have exactly the expected type, unless either side
/// is `any`. Unlike reads inside expressions, it may come from any enclosing
/// scope.
fn check_reference(
    access: &mut VariableAccess,
    expected: &DataType,
    scope: &Scope<'_>,
) -> Result<()> {
    let Some(found) = scope.get(&access.name) else {
        return Err(access.pos.wrap(Error::Undeclared(access.name.clone())));
    };
    if found != expected && !found.is_any() && !expected.is_any() {
        let error = Error::ReferenceMismatch {
            name: access.name.clone(),
            found: found.clone(),
            expected: expected.clone(),
        };
        return Err(access.pos.wrap(error));
    }
    for arg in &mut access.args {
        resolve_captures(arg, scope)?;
    }
    Ok(())
}

fn check_assignment(assignment: &mut VariableAssignment, scope: &Scope<'_>) -> Result<()> {
    let Some(target) = scope.get(&assignment.name).cloned() else {
        let error = Error::Undeclared(assignment.name.clone());
        return Err(assignment.pos.wrap(error));
    };
    match *assignment.value {
        Expr::Function(ref mut function) => check_function(function, &target, scope),
        Expr::Access(ref mut access) => check_reference(access, &target, scope),
        ref mut value => {
            let found = infer_type(value, scope)?;
            if found == target {
                Ok(())
            } else {
                let error = Error::AssignmentMismatch {
                    name: assignment.name.clone(),
                    found,
                    expected: target,
                };
                Err(assignment.pos.wrap(error))
            }
        }
    }
}

/// Infers the static type of `expr`, annotating the captures inside it.
///
/// Plain variable reads only see `scope` itself, not its parents. Reaching
/// an enclosing scope takes a `^capture`.
pub fn infer_type(expr: &mut Expr, scope: &Scope<'_>) -> Result<DataType> {
    match expr {
        Expr::Integer(_) => Ok(DataType::Integer),
        Expr::Float(_) => Ok(DataType::Float),
        Expr::String(_) => Ok(DataType::String),
        Expr::Boolean(_) => Ok(DataType::Bool),
        Expr::Function(function) => {
            let return_type = function.return_type.clone();
            check_function(function, &return_type, scope)?;
            Ok(DataType::Function)
        }
        Expr::List(list) => {
            for element in &mut list.elements {
                resolve_captures(element, scope)?;
            }
            Ok(DataType::list_of(list.element_type.clone()))
        }
        Expr::Access(access) => {
            let Some(ty) = scope.get_immediate(&access.name).cloned() else {
                return Err(access.pos.wrap(Error::Undeclared(access.name.clone())));
            };
            for arg in &mut access.args {
                resolve_captures(arg, scope)?;
            }
            Ok(ty)
        }
        Expr::Capture(capture) => resolve_capture(capture, scope),
        Expr::Binary(binary) => infer_binary(binary, scope),
        Expr::Unary(unary) => infer_unary(unary, scope),
        Expr::Assignment(assignment) => {
            check_assignment(assignment, scope)?;
            Ok(DataType::Void)
        }
    }
}

fn infer_binary(binary: &mut BinaryExpression, scope: &Scope<'_>) -> Result<DataType> {
    let left = infer_type(&mut binary.left, scope)?;
    let right = infer_type(&mut binary.right, scope)?;
    let key = format!("{left} {} {right}", binary.op.as_str());
    if let Some(ty) = OPERATIONS.get(key.as_str()) {
        return Ok(ty.clone());
    }
    if left.is_any() || right.is_any() {
        return Ok(DataType::Any);
    }
    let error = Error::InvalidOperation {
        op: binary.op,
        left,
        right,
    };
    Err(binary.pos.wrap(error))
}

fn infer_unary(unary: &mut UnaryExpression, scope: &Scope<'_>) -> Result<DataType> {
    let operand = infer_type(&mut unary.operand, scope)?;
    match (unary.op, &operand) {
        (_, DataType::Any) => Ok(DataType::Any),
        (UnaryOperator::Not, DataType::Bool) => Ok(DataType::Bool),
        (UnaryOperator::Neg, DataType::Integer | DataType::Float) => Ok(operand),
        _ => {
            let error = Error::InvalidUnary {
                op: unary.op,
                operand,
            };
            Err(unary.pos.wrap(error))
        }
    }
}

/// Resolves a capture through the whole scope chain and records the type
/// on the node.
fn resolve_capture(capture: &mut VariableCaptureAccess, scope: &Scope<'_>) -> Result<DataType> {
    let access = &mut capture.access;
    let Some(ty) = scope.get(&access.name).cloned() else {
        return Err(access.pos.wrap(Error::UnresolvedCapture(access.name.clone())));
    };
    for arg in &mut access.args {
        resolve_captures(arg, scope)?;
    }
    capture.resolved = Some(ty.clone());
    Ok(ty)
}

/// Annotates every capture in `expr` without type checking `expr` itself.
/// Function literals met along the way are checked in full.
fn resolve_captures(expr: &mut Expr, scope: &Scope<'_>) -> Result<()> {
    match expr {
        Expr::Integer(_) | Expr::Float(_) | Expr::String(_) | Expr::Boolean(_) => Ok(()),
        Expr::Capture(capture) => resolve_capture(capture, scope).map(drop),
        Expr::Access(access) => access
            .args
            .iter_mut()
            .try_for_each(|arg| resolve_captures(arg, scope)),
        Expr::List(list) => list
            .elements
            .iter_mut()
            .try_for_each(|element| resolve_captures(element, scope)),
        Expr::Assignment(assignment) => resolve_captures(&mut assignment.value, scope),
        Expr::Binary(binary) => {
            resolve_captures(&mut binary.left, scope)?;
            resolve_captures(&mut binary.right, scope)
        }
        Expr::Unary(unary) => resolve_captures(&mut unary.operand, scope),
        Expr::Function(function) => {
            let return_type = function.return_type.clone();
            check_function(function, &return_type, scope)
        }
    }
}

/// Lists the names `body` reads or assigns without them being bound in
/// `scope`'s chain or declared by `body` itself. Nested function bodies are
/// walked with their parameters bound. Each name is listed once, in order of
/// first use, with its type left unresolved.
pub fn free_variables(body: &[Node], scope: &Scope<'_>) -> Vec<(Ident, Option<DataType>)> {
    let mut local = scope.child();
    let mut free = Vec::new();
    collect_free_in_body(body, &mut local, &mut free);
    free
}

fn collect_free_in_body(
    body: &[Node],
    scope: &mut Scope<'_>,
    free: &mut Vec<(Ident, Option<DataType>)>,
) {
    for node in body {
        match node {
            Node::Stmt(Stmt::VariableDeclaration(decl)) => {
                // Redeclarations are the checker's business.
                let _ = scope.declare(&decl.name, decl.ty.clone());
                collect_free_in_expr(&decl.initializer, scope, free);
            }
            Node::Stmt(Stmt::If(stmt)) => {
                collect_free_in_expr(&stmt.condition, scope, free);
                collect_free_in_body(&stmt.then_body, scope, free);
                collect_free_in_body(&stmt.else_body, scope, free);
            }
            Node::Stmt(Stmt::Return(stmt)) => {
                if let Some(ref value) = stmt.value {
                    collect_free_in_expr(value, scope, free);
                }
            }
            Node::Expr(expr) => collect_free_in_expr(expr, scope, free),
        }
    }
}

fn collect_free_in_expr(expr: &Expr, scope: &Scope<'_>, free: &mut Vec<(Ident, Option<DataType>)>) {
    let note = |name: &Ident, free: &mut Vec<(Ident, Option<DataType>)>| {
        if scope.get(name).is_none() && !free.iter().any(|(seen, _)| seen == name) {
            free.push((name.clone(), None));
        }
    };
    match expr {
        Expr::Integer(_) | Expr::Float(_) | Expr::String(_) | Expr::Boolean(_) => {}
        Expr::Access(access) | Expr::Capture(VariableCaptureAccess { access, .. }) => {
            note(&access.name, free);
            for arg in &access.args {
                collect_free_in_expr(arg, scope, free);
            }
        }
        Expr::Assignment(assignment) => {
            note(&assignment.name, free);
            collect_free_in_expr(&assignment.value, scope, free);
        }
        Expr::List(list) => {
            for element in &list.elements {
                collect_free_in_expr(element, scope, free);
            }
        }
        Expr::Binary(binary) => {
            collect_free_in_expr(&binary.left, scope, free);
            collect_free_in_expr(&binary.right, scope, free);
        }
        Expr::Unary(unary) => collect_free_in_expr(&unary.operand, scope, free),
        Expr::Function(function) => {
            let mut inner = scope.child();
            for param in &function.params {
                let _ = inner.declare(&param.name, param.ty.clone());
            }
            collect_free_in_body(&function.body, &mut inner, free);
        }
    }
}

fn format_params(params: &[Parameter]) -> String {
    let params: Vec<_> = params
        .iter()
        .map(|param| format!("{} {}", param.ty, param.name))
        .collect();
    format!("<{}>", params.join(", "))
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("variable {name} is already declared in this scope (as {existing})")]
    Redeclaration { name: Ident, existing: DataType },
    #[error("variable {0} is not declared in this scope")]
    Undeclared(Ident),
    #[error("captured variable ^{0} is not declared in any enclosing scope")]
    UnresolvedCapture(Ident),
    #[error("return type {found} does not match expected type {expected}")]
    ReturnMismatch { found: DataType, expected: DataType },
    #[error("function return type {found} does not match variable type {expected}")]
    FunctionTypeMismatch { found: DataType, expected: DataType },
    #[error("variable {name} of type {found} does not match variable type {expected}")]
    ReferenceMismatch {
        name: Ident,
        found: DataType,
        expected: DataType,
    },
    #[error("can't assign a value of type {found} to {name} of type {expected}")]
    AssignmentMismatch {
        name: Ident,
        found: DataType,
        expected: DataType,
    },
    #[error("non-void function of return type {0} does not return a value")]
    MissingReturn(DataType),
    #[error("variable {0} must be initialized with a function or a variable")]
    InvalidInitializer(Ident),
    #[error("operation {} is not valid for types {left} and {right}", .op.as_str())]
    InvalidOperation {
        op: BinaryOperator,
        left: DataType,
        right: DataType,
    },
    #[error("operator {} is not valid for type {operand}", .op.as_str())]
    InvalidUnary {
        op: UnaryOperator,
        operand: DataType,
    },
    #[error("function parameters {found} do not match the declared signature {expected}")]
    SignatureMismatch { expected: String, found: String },
    #[error("return statement outside of a function")]
    ReturnOutsideFunction,
}
