/// Events and commands flowing through the dashboard
///
/// Every input (keys, resizes, sampler results) arrives as a `Msg` on one
/// queue. Reducers answer with `Command`s that the scheduler executes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::core::docker::{ContainerRecord, ContainerStats};
use crate::core::metrics::{CpuSnapshot, MetricClass, MetricSnapshot};
use crate::core::sampler::SampleError;

/// Keys the dashboard reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Space,
    Esc,
    /// ctrl+c
    Interrupt,
    Char(char),
    Other,
}

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        match event.code {
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => Key::Interrupt,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Enter => Key::Enter,
            KeyCode::Esc => Key::Esc,
            KeyCode::Char(' ') => Key::Space,
            KeyCode::Char(c) => Key::Char(c),
            _ => Key::Other,
        }
    }
}

/// Successful result of one collection call
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Cpu(CpuSnapshot),
    Memory(MetricSnapshot),
    Swap(MetricSnapshot),
    Disk(MetricSnapshot),
    Containers(Vec<ContainerRecord>),
    ContainerStats(HashMap<String, ContainerStats>),
}

impl Sample {
    pub fn class(&self) -> MetricClass {
        match self {
            Sample::Cpu(_) => MetricClass::Cpu,
            Sample::Memory(_) => MetricClass::Memory,
            Sample::Swap(_) => MetricClass::Swap,
            Sample::Disk(_) => MetricClass::Disk,
            Sample::Containers(_) => MetricClass::Containers,
            Sample::ContainerStats(_) => MetricClass::ContainerStats,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Key(Key),
    Resize { width: u16, height: u16 },
    Sampled(Sample),
    SampleFailed(SampleError),
}

/// Checked container ids, shared between the containers panel and its
/// armed stats poll.
///
/// The panel writes through its handle whenever the selection changes and
/// the sampler reads the ids only when the timer fires.
#[derive(Debug, Clone, Default)]
pub struct SelectedIds(Arc<RwLock<BTreeSet<String>>>);

impl SelectedIds {
    /// Ids checked right now, in id order
    pub fn snapshot(&self) -> Vec<String> {
        let ids = self.0.read().unwrap_or_else(PoisonError::into_inner);
        ids.iter().cloned().collect()
    }

    pub fn replace(&self, ids: &BTreeSet<String>) {
        let mut current = self.0.write().unwrap_or_else(PoisonError::into_inner);
        if *current != *ids {
            current.clone_from(ids);
        }
    }
}

impl FromIterator<String> for SelectedIds {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(Arc::new(RwLock::new(iter.into_iter().collect())))
    }
}

impl PartialEq for SelectedIds {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.snapshot() == other.snapshot()
    }
}

impl Eq for SelectedIds {}

/// What a sampler should collect when its timer fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleRequest {
    Cpu,
    Memory,
    Swap,
    Disk,
    Containers,
    /// Stats for whatever is checked at fire time
    ContainerStats(SelectedIds),
}

impl SampleRequest {
    pub fn class(&self) -> MetricClass {
        match self {
            SampleRequest::Cpu => MetricClass::Cpu,
            SampleRequest::Memory => MetricClass::Memory,
            SampleRequest::Swap => MetricClass::Swap,
            SampleRequest::Disk => MetricClass::Disk,
            SampleRequest::Containers => MetricClass::Containers,
            SampleRequest::ContainerStats(_) => MetricClass::ContainerStats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Arm a one-shot timer that samples `request` after `after`
    Schedule { request: SampleRequest, after: Duration },
    Quit,
}

impl Command {
    pub fn schedule(request: SampleRequest, after: Duration) -> Self {
        Command::Schedule { request, after }
    }

    /// Class this command polls, if it is a schedule
    pub fn polls(&self) -> Option<MetricClass> {
        match self {
            Command::Schedule { request, .. } => Some(request.class()),
            Command::Quit => None,
        }
    }
}
