/*
 * Copyright (c) 2026-present, the Ladybird developers.
 *
 * SPDX-License-Identifier: BSD-2-Clause
 */

//! Generator objects.
//!
//! A generator owns its suspended `Frame`. Resuming moves the frame out of
//! the object, runs it until the next suspension or completion, and puts it
//! back; while it runs the generator is `Executing` and refuses re-entry.

use super::interpreter::{Frame, FrameExit, run_frame};
use super::object::{ObjectKind, ObjectRef};
use super::realm::Realm;
use super::value::{JsResult, Value};
use super::vm_error::VmError;
use crate::ir::instruction::ResumeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Created, parameters not yet bound.
    NotStarted,
    /// Parked on `StartGenerator`; the body has not run.
    SuspendedAtStart,
    SuspendedAtYield(u32),
    Executing,
    Completed,
}

pub struct GeneratorData {
    pub state: GeneratorState,
    frame: Option<Box<Frame>>,
}

/// The input to a resumption.
#[derive(Debug, Clone)]
pub struct ResumeCommand {
    pub kind: ResumeKind,
    pub value: Value,
}

impl ResumeCommand {
    pub fn next(value: Value) -> Self {
        Self { kind: ResumeKind::Next, value }
    }

    pub fn throw(value: Value) -> Self {
        Self { kind: ResumeKind::Throw, value }
    }

    pub fn return_(value: Value) -> Self {
        Self { kind: ResumeKind::Return, value }
    }
}

/// Run a fresh generator frame up to its start suspension and wrap it in a
/// generator object.
pub fn create_generator(realm: &mut Realm, mut frame: Box<Frame>) -> JsResult {
    let generator = ObjectRef::new(
        ObjectKind::Generator(GeneratorData { state: GeneratorState::NotStarted, frame: None }),
        Some(realm.prototypes.generator.clone()),
    );
    match run_frame(realm, &mut frame)? {
        FrameExit::Suspend { suspension: None, .. } => {}
        FrameExit::Suspend { suspension: Some(_), .. } | FrameExit::Return(_) => {
            return Err(realm.error_value(VmError::MissingStartSuspension));
        }
    }
    set_state(&generator, GeneratorState::SuspendedAtStart, Some(frame));
    Ok(Value::Object(generator))
}

pub fn generator_state(generator: &ObjectRef) -> Option<GeneratorState> {
    match &generator.borrow().kind {
        ObjectKind::Generator(data) => Some(data.state),
        _ => None,
    }
}

fn set_state(generator: &ObjectRef, state: GeneratorState, frame: Option<Box<Frame>>) {
    if let ObjectKind::Generator(data) = &mut generator.borrow_mut().kind {
        log::trace!("generator: {:?} -> {:?}", data.state, state);
        data.state = state;
        data.frame = frame;
    }
}

/// Resume `generator` with `command`. Returns the iterator result object
/// for this step.
pub fn resume(realm: &mut Realm, generator: &ObjectRef, command: ResumeCommand) -> JsResult {
    enum Taken {
        NotAGenerator,
        Running,
        Finished,
        Frame(Box<Frame>),
    }

    let taken = match &mut generator.borrow_mut().kind {
        ObjectKind::Generator(data) => match (data.state, data.frame.take()) {
            (GeneratorState::Executing, _) => Taken::Running,
            (
                GeneratorState::SuspendedAtStart | GeneratorState::SuspendedAtYield(_),
                Some(frame),
            ) => Taken::Frame(frame),
            _ => Taken::Finished,
        },
        _ => Taken::NotAGenerator,
    };

    let mut frame = match taken {
        Taken::NotAGenerator => return Err(realm.error_value(VmError::NotAGenerator)),
        Taken::Running => return Err(realm.error_value(VmError::GeneratorRunning)),
        Taken::Finished => {
            return match command.kind {
                ResumeKind::Next => Ok(realm.iter_result(Value::Undefined, true)),
                ResumeKind::Return => Ok(realm.iter_result(command.value, true)),
                ResumeKind::Throw => Err(command.value),
            };
        }
        Taken::Frame(frame) => frame,
    };

    set_state(generator, GeneratorState::Executing, None);
    frame.resume = Some(command);
    match run_frame(realm, &mut frame) {
        Ok(FrameExit::Suspend { value, suspension }) => {
            let state = suspension
                .map_or(GeneratorState::SuspendedAtStart, GeneratorState::SuspendedAtYield);
            set_state(generator, state, Some(frame));
            Ok(value)
        }
        Ok(FrameExit::Return(value)) => {
            set_state(generator, GeneratorState::Completed, None);
            Ok(realm.iter_result(value, true))
        }
        Err(exception) => {
            set_state(generator, GeneratorState::Completed, None);
            Err(exception)
        }
    }
}

/// `this` as a generator object, or a TypeError.
pub fn this_generator(realm: &mut Realm, this_value: &Value) -> JsResult<ObjectRef> {
    match this_value.as_object() {
        Some(object) if generator_state(object).is_some() => Ok(object.clone()),
        _ => Err(realm.error_value(VmError::NotAGenerator)),
    }
}
