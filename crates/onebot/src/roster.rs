//! Posting state: which chats currently receive hub traffic.
//!
//! Every configured recipient is in exactly one of two places: the ordered
//! active list of its kind, or the muted set. Commands move recipients
//! between the two; nothing else changes membership.

use std::{collections::BTreeSet, fmt};

use chatbridge_config::BridgeConfig;

use crate::command::Command;

/// A chat the bot can post to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Recipient {
    Group(i64),
    Friend(i64),
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group {id}"),
            Self::Friend(id) => write!(f, "friend {id}"),
        }
    }
}

/// Whether a command moved a recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved,
    /// Already in the requested state, or not a configured recipient.
    Unchanged,
}

#[derive(Debug, Clone, Default)]
struct Roster {
    active: Vec<i64>,
    muted: BTreeSet<i64>,
}

impl Roster {
    fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        let mut active = Vec::new();
        for id in ids {
            if !active.contains(&id) {
                active.push(id);
            }
        }
        Self {
            active,
            muted: BTreeSet::new(),
        }
    }

    fn mute(&mut self, id: i64) -> Transition {
        match self.active.iter().position(|&a| a == id) {
            Some(pos) => {
                self.active.remove(pos);
                self.muted.insert(id);
                Transition::Moved
            },
            None => Transition::Unchanged,
        }
    }

    /// Unmuted recipients go to the end of the active list.
    fn unmute(&mut self, id: i64) -> Transition {
        if self.muted.remove(&id) {
            self.active.push(id);
            Transition::Moved
        } else {
            Transition::Unchanged
        }
    }
}

/// Active and muted recipients for both kinds.
#[derive(Debug, Clone, Default)]
pub struct PostingState {
    groups: Roster,
    friends: Roster,
}

impl PostingState {
    pub fn new(
        groups: impl IntoIterator<Item = i64>,
        friends: impl IntoIterator<Item = i64>,
    ) -> Self {
        Self {
            groups: Roster::new(groups),
            friends: Roster::new(friends),
        }
    }

    /// Entries with `post: true`, in configuration order.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            config.groups.iter().filter(|g| g.post).map(|g| g.id),
            config.friends.iter().filter(|f| f.post).map(|f| f.id),
        )
    }

    fn roster_mut(&mut self, recipient: Recipient) -> (&mut Roster, i64) {
        match recipient {
            Recipient::Group(id) => (&mut self.groups, id),
            Recipient::Friend(id) => (&mut self.friends, id),
        }
    }

    pub fn apply(&mut self, command: Command, scope: Recipient) -> Transition {
        match command {
            Command::StopPosting => self.stop_posting(scope),
            Command::StartPosting => self.start_posting(scope),
        }
    }

    pub fn stop_posting(&mut self, recipient: Recipient) -> Transition {
        let (roster, id) = self.roster_mut(recipient);
        roster.mute(id)
    }

    pub fn start_posting(&mut self, recipient: Recipient) -> Transition {
        let (roster, id) = self.roster_mut(recipient);
        roster.unmute(id)
    }

    /// Current fan-out order: active groups first, then active friends.
    pub fn recipients(&self) -> impl Iterator<Item = Recipient> + '_ {
        self.groups
            .active
            .iter()
            .copied()
            .map(Recipient::Group)
            .chain(self.friends.active.iter().copied().map(Recipient::Friend))
    }

    pub fn muted(&self) -> impl Iterator<Item = Recipient> + '_ {
        self.groups
            .muted
            .iter()
            .copied()
            .map(Recipient::Group)
            .chain(self.friends.muted.iter().copied().map(Recipient::Friend))
    }

    pub fn is_active(&self, recipient: Recipient) -> bool {
        self.recipients().any(|r| r == recipient)
    }

    pub fn is_muted(&self, recipient: Recipient) -> bool {
        match recipient {
            Recipient::Group(id) => self.groups.muted.contains(&id),
            Recipient::Friend(id) => self.friends.muted.contains(&id),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn state() -> PostingState {
        PostingState::new([1, 2, 3], [10])
    }

    #[test]
    fn fans_out_groups_then_friends_in_order() {
        let recipients: Vec<_> = state().recipients().collect();
        assert_eq!(
            recipients,
            vec![
                Recipient::Group(1),
                Recipient::Group(2),
                Recipient::Group(3),
                Recipient::Friend(10),
            ]
        );
    }

    #[test]
    fn duplicate_ids_collapse() {
        let state = PostingState::new([5, 5, 6], []);
        assert_eq!(state.recipients().count(), 2);
    }

    #[test]
    fn stop_then_start_moves_to_the_end() {
        let mut state = state();
        assert_eq!(state.stop_posting(Recipient::Group(1)), Transition::Moved);
        assert!(state.is_muted(Recipient::Group(1)));
        assert!(!state.is_active(Recipient::Group(1)));

        assert_eq!(state.start_posting(Recipient::Group(1)), Transition::Moved);
        let groups: Vec<_> = state.recipients().take(3).collect();
        assert_eq!(
            groups,
            vec![Recipient::Group(2), Recipient::Group(3), Recipient::Group(1)]
        );
    }

    #[test]
    fn repeated_commands_are_no_ops() {
        let mut state = state();
        assert_eq!(state.start_posting(Recipient::Friend(10)), Transition::Unchanged);
        assert_eq!(state.stop_posting(Recipient::Friend(10)), Transition::Moved);
        assert_eq!(state.stop_posting(Recipient::Friend(10)), Transition::Unchanged);
        assert_eq!(state.muted().collect::<Vec<_>>(), vec![Recipient::Friend(10)]);
    }

    #[rstest]
    #[case(Recipient::Group(99))]
    #[case(Recipient::Friend(1))]
    fn unconfigured_recipients_are_ignored(#[case] recipient: Recipient) {
        let mut state = state();
        assert_eq!(state.stop_posting(recipient), Transition::Unchanged);
        assert_eq!(state.start_posting(recipient), Transition::Unchanged);
        assert!(!state.is_muted(recipient));
        assert_eq!(state.recipients().count(), 4);
    }

    #[test]
    fn every_recipient_stays_in_exactly_one_place() {
        let all = [
            Recipient::Group(1),
            Recipient::Group(2),
            Recipient::Group(3),
            Recipient::Friend(10),
        ];
        let commands = [Command::StopPosting, Command::StartPosting];
        let mut state = state();
        // Walk a fixed but irregular command sequence.
        for step in 0..64usize {
            let recipient = all[(step * 7 + step / 3) % all.len()];
            let command = commands[(step / 2 + step % 3) % 2];
            state.apply(command, recipient);
            for r in all {
                assert_ne!(state.is_active(r), state.is_muted(r), "{r} after step {step}");
            }
        }
    }
}
