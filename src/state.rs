use std::collections::HashMap;

use crate::protocol::{Avatar, PlayerPatch, PlayerState};

/// Local mirror of the server's players and avatar catalog.
///
/// Only the inbound message path mutates it; the camera and renderer read it
/// between ticks.
#[derive(Debug, Default)]
pub struct WorldState {
    my_id: Option<String>,
    players: HashMap<String, PlayerState>,
    avatars: HashMap<String, Avatar>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn my_id(&self) -> Option<&str> {
        self.my_id.as_deref()
    }

    pub fn me(&self) -> Option<&PlayerState> {
        self.my_id.as_ref().and_then(|id| self.players.get(id))
    }

    #[cfg(test)]
    pub(crate) fn player(&self, id: &str) -> Option<&PlayerState> {
        self.players.get(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    #[cfg(test)]
    pub(crate) fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn avatar(&self, name: &str) -> Option<&Avatar> {
        self.avatars.get(name)
    }

    pub fn avatars(&self) -> impl Iterator<Item = &Avatar> {
        self.avatars.values()
    }

    /// Replace everything with the join acknowledgment's snapshot.
    pub fn apply_join_ack(
        &mut self,
        my_id: String,
        players: HashMap<String, PlayerState>,
        avatars: HashMap<String, Avatar>,
    ) {
        self.players = players
            .into_iter()
            .map(|(id, mut p)| {
                p.id = id.clone();
                (id, p)
            })
            .collect();
        self.avatars = avatars
            .into_iter()
            .map(|(name, mut a)| {
                a.name = name.clone();
                (name, a)
            })
            .collect();
        self.my_id = Some(my_id);
    }

    /// Field-sparse merge: absent fields and absent ids stay as they were.
    pub fn apply_players_moved(&mut self, patches: &HashMap<String, PlayerPatch>) {
        for (id, patch) in patches {
            let player = self.players.entry(id.clone()).or_insert_with(|| PlayerState {
                id: id.clone(),
                ..Default::default()
            });
            patch.apply_to(player);
        }
    }

    pub fn apply_player_joined(&mut self, player: PlayerState, avatar: Avatar) {
        if !avatar.name.is_empty() {
            self.avatars.insert(avatar.name.clone(), avatar);
        }
        self.players.insert(player.id.clone(), player);
    }

    /// Returns whether an entry was removed. The local player's own entry is kept.
    pub fn apply_player_left(&mut self, id: &str) -> bool {
        if self.my_id.as_deref() == Some(id) {
            log::warn!("ignoring player_left for the local player {}", id);
            return false;
        }
        self.players.remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Facing;
    use std::collections::BTreeMap;

    fn player(id: &str, x: f64, y: f64) -> PlayerState {
        PlayerState {
            id: id.to_string(),
            username: format!("user-{}", id),
            x,
            y,
            facing: Facing::Down,
            animation_frame: 0,
            avatar_name: "knight".to_string(),
        }
    }

    fn avatar(name: &str, source: &str) -> Avatar {
        let mut frames = BTreeMap::new();
        frames.insert(Facing::Down, vec![source.to_string()]);
        Avatar { name: name.to_string(), frames }
    }

    fn joined_world() -> WorldState {
        let mut world = WorldState::new();
        let mut players = HashMap::new();
        players.insert("p1".to_string(), player("p1", 100.0, 100.0));
        players.insert("p2".to_string(), player("p2", 300.0, 50.0));
        let mut avatars = HashMap::new();
        avatars.insert("knight".to_string(), avatar("knight", "k0"));
        world.apply_join_ack("p1".to_string(), players, avatars);
        world
    }

    #[test]
    fn join_ack_replaces_everything() {
        let mut world = joined_world();
        let mut players = HashMap::new();
        players.insert("p7".to_string(), player("", 1.0, 2.0));
        world.apply_join_ack("p7".to_string(), players, HashMap::new());

        assert_eq!(world.my_id(), Some("p7"));
        assert_eq!(world.player_count(), 1);
        assert!(world.player("p1").is_none());
        assert!(world.avatar("knight").is_none());
        // id is taken from the map key when the record omits it
        assert_eq!(world.me().map(|p| p.id.as_str()), Some("p7"));
    }

    #[test]
    fn partial_merges_leave_absent_fields_alone() {
        let mut world = joined_world();
        let mut patches = HashMap::new();
        patches.insert("p1".to_string(), PlayerPatch { x: Some(150.0), ..Default::default() });
        world.apply_players_moved(&patches);

        let mut patches = HashMap::new();
        patches.insert(
            "p1".to_string(),
            PlayerPatch { facing: Some(Facing::Up), animation_frame: Some(3), ..Default::default() },
        );
        world.apply_players_moved(&patches);

        let p1 = world.player("p1").unwrap();
        assert_eq!(p1.x, 150.0);
        assert_eq!(p1.y, 100.0);
        assert_eq!(p1.facing, Facing::Up);
        assert_eq!(p1.animation_frame, 3);
        assert_eq!(p1.username, "user-p1");
        assert_eq!(p1.avatar_name, "knight");

        let p2 = world.player("p2").unwrap();
        assert_eq!((p2.x, p2.y), (300.0, 50.0));
    }

    #[test]
    fn players_moved_adds_unknown_ids() {
        let mut world = joined_world();
        let mut patches = HashMap::new();
        patches.insert(
            "p3".to_string(),
            PlayerPatch { x: Some(9.0), y: Some(8.0), username: Some("new".into()), ..Default::default() },
        );
        world.apply_players_moved(&patches);

        let p3 = world.player("p3").unwrap();
        assert_eq!(p3.id, "p3");
        assert_eq!((p3.x, p3.y), (9.0, 8.0));
        assert_eq!(world.player_count(), 3);
    }

    #[test]
    fn player_joined_overwrites_avatar_with_same_name() {
        let mut world = joined_world();
        world.apply_player_joined(player("p3", 0.0, 0.0), avatar("knight", "k1"));

        assert!(world.player("p3").is_some());
        assert_eq!(world.avatar("knight").unwrap().frames[&Facing::Down], vec!["k1".to_string()]);
    }

    #[test]
    fn player_left_for_unknown_id_is_a_no_op() {
        let mut world = joined_world();
        assert!(!world.apply_player_left("nobody"));
        assert_eq!(world.player_count(), 2);

        assert!(world.apply_player_left("p2"));
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn local_player_survives_player_left() {
        let mut world = joined_world();
        assert!(!world.apply_player_left("p1"));
        assert!(world.me().is_some());
    }
}
