//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Room registry
//!
//! Process-wide map from room name to [`GameRoom`]. Rooms are created lazily
//! on first reference and evicted once their last player leaves.
//!
//! Locks are always taken registry shard first, then room. Admission runs
//! while the shard entry is held, so a room cannot be evicted between lookup
//! and admission.

use crate::room::{GameRoom, PlayerHandle};
use crate::{PlayerIndex, Result, ServerMessage, ServerMetrics};
use dashmap::DashMap;
use gambit_rules::RulesEngine;
use std::sync::Arc;
use tracing::{debug, info};

/// Concurrent map of live rooms
pub struct RoomRegistry<R: RulesEngine> {
    rooms: DashMap<String, Arc<GameRoom<R>>>,
    rules: Arc<R>,
    metrics: Arc<ServerMetrics>,
}

impl<R: RulesEngine> RoomRegistry<R> {
    /// Create an empty registry whose rooms use `rules`
    pub fn new(rules: Arc<R>, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            rooms: DashMap::new(),
            rules,
            metrics,
        }
    }

    /// Get the room called `name`, creating it if absent
    ///
    /// Concurrent callers with the same unseen name observe exactly one room.
    pub fn get_or_create(&self, name: &str) -> Arc<GameRoom<R>> {
        self.rooms
            .entry(name.to_string())
            .or_insert_with(|| self.create(name))
            .value()
            .clone()
    }

    /// Seat a player in the room called `name`, creating it if absent
    pub fn join(&self, name: &str, handle: PlayerHandle) -> Result<(Arc<GameRoom<R>>, PlayerIndex)> {
        let entry = self
            .rooms
            .entry(name.to_string())
            .or_insert_with(|| self.create(name));
        let index = entry.admit(handle)?;
        Ok((Arc::clone(entry.value()), index))
    }

    /// Evict `room` if it is still the room registered under `name` and has no
    /// players left
    pub fn remove(&self, name: &str, room: &Arc<GameRoom<R>>) -> bool {
        let removed = self
            .rooms
            .remove_if(name, |_, current| Arc::ptr_eq(current, room) && current.is_empty())
            .is_some();
        if removed {
            self.metrics.room_removed();
            debug!(room = %name, "Room removed");
        }
        removed
    }

    /// Get the room called `name`
    pub fn get(&self, name: &str) -> Option<Arc<GameRoom<R>>> {
        self.rooms.get(name).map(|entry| entry.value().clone())
    }

    /// Get the number of live rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Check if there are no live rooms
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Get the names of all live rooms
    pub fn room_names(&self) -> Vec<String> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Tell every seated player the server is going down and drop all rooms
    pub fn shutdown(&self) {
        let rooms: Vec<Arc<GameRoom<R>>> = self
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        info!(rooms = rooms.len(), "Closing all rooms");

        for room in &rooms {
            room.close(ServerMessage::ServerShutdown);
        }
        for room in &rooms {
            if self
                .rooms
                .remove_if(room.name(), |_, current| Arc::ptr_eq(current, room))
                .is_some()
            {
                self.metrics.room_removed();
            }
        }
    }

    fn create(&self, name: &str) -> Arc<GameRoom<R>> {
        self.metrics.room_created();
        debug!(room = %name, "Room created");
        Arc::new(GameRoom::new(
            name,
            self.rules.clone(),
            self.metrics.clone(),
        ))
    }
}

impl<R: RulesEngine> std::fmt::Debug for RoomRegistry<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.rooms.len())
            .finish()
    }
}
