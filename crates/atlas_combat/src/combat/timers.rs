//! Scheduled tasks - отложенные callbacks без корутин.
//!
//! Очередь упорядочена по (fire_at, handle): задачи с одинаковым временем
//! исполняются в порядке постановки. Cancel = удаление по handle.

use bevy::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduledTask {
    /// Wall impact follow-up: продлить stagger
    ExtendStagger { entity: Entity, seconds: f32 },
    /// Floor impact: снять Ragdolled
    RecoverFromRagdoll { entity: Entity },
}

/// Время срабатывания (секунды симуляции)
#[derive(Debug, Clone, Copy, PartialEq)]
struct FireAt(f64);

impl Eq for FireAt {}

impl PartialOrd for FireAt {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FireAt {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Resource, Debug, Default)]
pub struct ScheduledTasks {
    now: f64,
    next_handle: u64,
    queue: BTreeMap<(FireAt, TaskHandle), ScheduledTask>,
}

impl ScheduledTasks {
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn schedule(&mut self, delay: f32, task: ScheduledTask) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        let fire_at = FireAt(self.now + f64::from(delay.max(0.0)));
        self.queue.insert((fire_at, handle), task);
        handle
    }

    /// Returns false если задача уже исполнена или отменена
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let key = self.queue.keys().find(|(_, h)| *h == handle).copied();
        match key {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Отменяет все задачи entity (despawn, revive)
    pub fn cancel_for(&mut self, entity: Entity) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, task| task.entity() != entity);
        before - self.queue.len()
    }

    /// Двигает часы и забирает все созревшие задачи (в порядке fire_at, handle)
    pub fn advance(&mut self, delta: f32) -> Vec<ScheduledTask> {
        self.now += f64::from(delta.max(0.0));

        let mut due = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 .0 > self.now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }
}

impl ScheduledTask {
    pub fn entity(&self) -> Entity {
        match self {
            ScheduledTask::ExtendStagger { entity, .. } => *entity,
            ScheduledTask::RecoverFromRagdoll { entity } => *entity,
        }
    }
}
