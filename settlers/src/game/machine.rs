//! The turn/phase state machine.
//!
//! Every client action funnels through [`GameState::apply`]. Validation
//! happens before any mutation, so a rejection leaves the state exactly as
//! it was; the caller decides whether to broadcast based on the returned
//! [`Outcome`].

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::game::action::{Action, Outcome};
use crate::game::constants::DISCARD_THRESHOLD;
use crate::game::entities::{
    COST_ROAD, COST_SETTLEMENT, Player, PlayerId, Point, Resource, ResourceBundle, Road,
    Settlement, TileFact,
};
use crate::game::error::GameError;
use crate::game::state::{GameState, Phase};

impl GameState {
    /// Validate `action` for `actor` against the current phase and apply
    /// it. Rejections mutate nothing.
    pub fn apply(
        &mut self,
        players: &mut [Player],
        actor: &PlayerId,
        action: Action,
        rng: &mut impl Rng,
    ) -> Result<Outcome, GameError> {
        if !players.iter().any(|p| &p.id == actor) {
            return Err(GameError::UnknownPlayer);
        }
        match action {
            Action::StartGame => self.start_game(players, rng),
            Action::EndTurn => self.end_turn(actor),
            Action::RollDice => self.roll_dice(players, actor, rng),
            Action::MoveKnight { tile_index } => self.move_knight(players, actor, tile_index, rng),
            Action::StealCard { target } => self.steal_card(players, actor, &target, rng),
            Action::DiscardCards { hand } => self.discard_cards(players, actor, hand),
            Action::PlaceSettlement {
                position,
                adjacent_tiles,
            } => self.place_settlement(players, actor, position, &adjacent_tiles),
            Action::PlaceRoad { start, end } => self.place_road(players, actor, start, end),
        }
    }

    fn start_game(
        &mut self,
        players: &[Player],
        rng: &mut impl Rng,
    ) -> Result<Outcome, GameError> {
        if self.phase != Phase::Lobby {
            return Err(GameError::GameInProgress);
        }
        if players.is_empty() {
            return Err(GameError::NotEnoughPlayers);
        }

        let mut order: Vec<PlayerId> = players.iter().map(|p| p.id.clone()).collect();
        order.shuffle(rng);
        debug!("game starting, turn order {order:?}");

        self.turn_order = order;
        self.turn_index = 0;
        self.setup_turn = 1;
        self.setup_placed_settlement = false;
        self.setup_placed_road = false;
        self.dice = None;
        self.phase = Phase::Setup;
        Ok(Outcome::Updated)
    }

    fn end_turn(&mut self, actor: &PlayerId) -> Result<Outcome, GameError> {
        match self.phase {
            Phase::Setup => {
                if !self.is_current(actor) {
                    return Err(GameError::TurnViolation);
                }
                if !(self.setup_placed_settlement && self.setup_placed_road) {
                    return Err(GameError::SetupIncomplete);
                }
                self.advance_setup_turn();
                Ok(Outcome::Updated)
            }
            Phase::PlayerTurn => {
                if !self.is_current(actor) {
                    return Err(GameError::TurnViolation);
                }
                if !self.pending_discards.is_empty() {
                    return Err(GameError::PendingInterrupts);
                }
                self.turn_index = (self.turn_index + 1) % self.turn_order.len();
                self.dice = None;
                self.phase = Phase::RollingDice;
                Ok(Outcome::Updated)
            }
            // The robber sub-protocol cannot be skipped.
            Phase::PlayerTurnKnight | Phase::PlayerStealingCard => {
                if !self.is_current(actor) {
                    return Err(GameError::TurnViolation);
                }
                Err(GameError::PendingInterrupts)
            }
            Phase::Lobby | Phase::RollingDice => Err(GameError::PhaseViolation),
        }
    }

    /// Snake order: forward over all players, hold on the last one for a
    /// step, then back to the first. Setup ends once the counter reaches
    /// `2 * player count` and that final turn is done.
    fn advance_setup_turn(&mut self) {
        let n = self.turn_order.len();
        if self.setup_turn >= 2 * n {
            self.phase = Phase::RollingDice;
            self.turn_index = 0;
            self.dice = None;
        } else {
            self.setup_turn += 1;
            self.turn_index = snake_index(self.setup_turn, n);
        }
        self.setup_placed_settlement = false;
        self.setup_placed_road = false;
    }

    fn roll_dice(
        &mut self,
        players: &mut [Player],
        actor: &PlayerId,
        rng: &mut impl Rng,
    ) -> Result<Outcome, GameError> {
        if self.phase != Phase::RollingDice {
            return Err(GameError::PhaseViolation);
        }
        if !self.is_current(actor) {
            return Err(GameError::TurnViolation);
        }
        let dice = (rng.random_range(1..=6), rng.random_range(1..=6));
        Ok(self.apply_roll(players, dice))
    }

    /// Everything after the dice leave the cup. Split from `roll_dice` so
    /// the outcome of a known roll can be exercised deterministically.
    pub(crate) fn apply_roll(&mut self, players: &mut [Player], dice: (u8, u8)) -> Outcome {
        self.dice = Some(dice);
        let total = dice.0 + dice.1;

        if total == 7 {
            self.phase = Phase::PlayerTurnKnight;
            for player in players.iter() {
                if player.hand.len() > DISCARD_THRESHOLD {
                    self.pending_discards
                        .insert(player.id.clone(), player.hand.len() / 2);
                }
            }
            debug!(
                "rolled 7, {} player(s) must discard",
                self.pending_discards.len()
            );
            return Outcome::KnightRolled;
        }

        self.phase = Phase::PlayerTurn;

        // One card per matching adjacent tile, batched so every grant sees
        // the same pre-roll hands. The robber's tile never produces, and a
        // grant the bank cannot cover is withheld rather than an error.
        let mut grants: Vec<(PlayerId, Resource)> = Vec::new();
        for settlement in &self.settlements {
            for fact in &settlement.adjacent_tiles {
                if fact.token != Some(total) || fact.tile_index == self.robber_index {
                    continue;
                }
                if let Some(resource) = fact.kind.resource() {
                    grants.push((settlement.owner.clone(), resource));
                }
            }
        }
        for (owner, resource) in grants {
            if self.bank.get(resource) == 0 {
                continue;
            }
            // A departed owner's settlement stays on the board but no
            // longer collects.
            let Some(player) = players.iter_mut().find(|p| p.id == owner) else {
                continue;
            };
            if self.bank.subtract(resource, 1).is_ok() {
                player.hand.push(resource);
            }
        }

        Outcome::DiceRolled
    }

    fn move_knight(
        &mut self,
        players: &mut [Player],
        actor: &PlayerId,
        tile_index: usize,
        rng: &mut impl Rng,
    ) -> Result<Outcome, GameError> {
        if self.phase != Phase::PlayerTurnKnight {
            return Err(GameError::PhaseViolation);
        }
        if !self.is_current(actor) {
            return Err(GameError::TurnViolation);
        }
        if !self.pending_discards.is_empty() {
            return Err(GameError::PendingInterrupts);
        }
        if tile_index >= self.tiles.len() {
            return Err(GameError::UnknownTile(tile_index));
        }
        if tile_index == self.robber_index {
            return Err(GameError::RobberStayedPut);
        }

        self.robber_index = tile_index;

        // Opponents with a settlement on the target tile and at least one
        // card, deduplicated.
        let mut eligible: Vec<PlayerId> = Vec::new();
        for settlement in &self.settlements {
            if settlement.owner == *actor || eligible.contains(&settlement.owner) {
                continue;
            }
            if !settlement
                .adjacent_tiles
                .iter()
                .any(|f| f.tile_index == tile_index)
            {
                continue;
            }
            if players
                .iter()
                .any(|p| p.id == settlement.owner && !p.hand.is_empty())
            {
                eligible.push(settlement.owner.clone());
            }
        }

        match eligible.len() {
            0 => {
                self.phase = Phase::PlayerTurn;
            }
            1 => {
                transfer_random_card(players, &eligible[0], actor, rng);
                self.phase = Phase::PlayerTurn;
            }
            _ => {
                self.steal_candidates = eligible;
                self.phase = Phase::PlayerStealingCard;
            }
        }
        Ok(Outcome::Updated)
    }

    fn steal_card(
        &mut self,
        players: &mut [Player],
        actor: &PlayerId,
        target: &PlayerId,
        rng: &mut impl Rng,
    ) -> Result<Outcome, GameError> {
        if self.phase != Phase::PlayerStealingCard {
            return Err(GameError::PhaseViolation);
        }
        if !self.is_current(actor) {
            return Err(GameError::TurnViolation);
        }
        if !self.steal_candidates.contains(target) {
            return Err(GameError::IneligibleTarget);
        }

        transfer_random_card(players, target, actor, rng);
        self.steal_candidates.clear();
        self.phase = Phase::PlayerTurn;
        Ok(Outcome::Updated)
    }

    /// Strict discard reconciliation: the replacement must be the prior
    /// hand minus exactly the required number of cards, kind for kind.
    /// Credits the per-kind difference back to the bank.
    fn discard_cards(
        &mut self,
        players: &mut [Player],
        actor: &PlayerId,
        replacement: Vec<Resource>,
    ) -> Result<Outcome, GameError> {
        let Some(&required) = self.pending_discards.get(actor) else {
            return Err(GameError::NoPendingDiscard);
        };
        let player = players
            .iter_mut()
            .find(|p| &p.id == actor)
            .ok_or(GameError::UnknownPlayer)?;

        let prior = ResourceBundle::tally(&player.hand);
        let kept = ResourceBundle::tally(&replacement);
        if replacement.len() + required != player.hand.len() || !prior.covers(&kept) {
            return Err(GameError::DiscardMismatch { required });
        }

        let mut returned = prior;
        // Cannot fail: prior covers kept.
        let _ = returned.subtract_bundle(&kept);
        self.bank.add_bundle(&returned);
        player.hand = replacement;
        self.pending_discards.remove(actor);
        debug!("{actor} discarded {returned}");
        Ok(Outcome::Updated)
    }

    /// Deterministic fallback for a discard nobody is resolving: take the
    /// required cards from the front of the hand. Returns false when the
    /// player owes nothing.
    pub fn force_discard(&mut self, players: &mut [Player], debtor: &PlayerId) -> bool {
        let Some(&required) = self.pending_discards.get(debtor) else {
            return false;
        };
        self.pending_discards.remove(debtor);
        let Some(player) = players.iter_mut().find(|p| &p.id == debtor) else {
            return true;
        };
        let take = required.min(player.hand.len());
        let drained: Vec<Resource> = player.hand.drain(..take).collect();
        self.bank.add_bundle(&ResourceBundle::tally(&drained));
        debug!("forced discard of {take} card(s) from {debtor}");
        true
    }

    fn place_settlement(
        &mut self,
        players: &mut [Player],
        actor: &PlayerId,
        position: Point,
        adjacent_tiles: &[usize],
    ) -> Result<Outcome, GameError> {
        // Resolve the adjacency cache against the tile table before any
        // mutation; a bad index rejects the whole action.
        let mut facts: Vec<TileFact> = Vec::with_capacity(adjacent_tiles.len());
        for &index in adjacent_tiles {
            let tile = self
                .tiles
                .get(index)
                .ok_or(GameError::UnknownTile(index))?;
            if facts.iter().any(|f| f.tile_index == index) {
                continue;
            }
            facts.push(TileFact {
                tile_index: index,
                kind: tile.kind,
                token: tile.token,
            });
        }

        match self.phase {
            Phase::Setup => {
                if !self.is_current(actor) {
                    return Err(GameError::TurnViolation);
                }
                if self.setup_placed_settlement {
                    return Err(GameError::PhaseViolation);
                }
                self.setup_placed_settlement = true;
            }
            Phase::PlayerTurn => {
                if !self.is_current(actor) {
                    return Err(GameError::TurnViolation);
                }
                let player = players
                    .iter_mut()
                    .find(|p| &p.id == actor)
                    .ok_or(GameError::UnknownPlayer)?;
                pay_cost(player, &COST_SETTLEMENT, &mut self.bank)?;
            }
            _ => return Err(GameError::PhaseViolation),
        }

        self.settlements.push(Settlement {
            owner: actor.clone(),
            position,
            adjacent_tiles: facts,
        });
        Ok(Outcome::Updated)
    }

    fn place_road(
        &mut self,
        players: &mut [Player],
        actor: &PlayerId,
        start: Point,
        end: Point,
    ) -> Result<Outcome, GameError> {
        match self.phase {
            Phase::Setup => {
                if !self.is_current(actor) {
                    return Err(GameError::TurnViolation);
                }
                if self.setup_placed_road {
                    return Err(GameError::PhaseViolation);
                }
                self.setup_placed_road = true;
            }
            Phase::PlayerTurn => {
                if !self.is_current(actor) {
                    return Err(GameError::TurnViolation);
                }
                let player = players
                    .iter_mut()
                    .find(|p| &p.id == actor)
                    .ok_or(GameError::UnknownPlayer)?;
                pay_cost(player, &COST_ROAD, &mut self.bank)?;
            }
            _ => return Err(GameError::PhaseViolation),
        }

        self.roads.push(Road {
            owner: actor.clone(),
            start,
            end,
        });
        Ok(Outcome::Updated)
    }

    /// A player left the room. Their cards return to the bank, their
    /// pending interrupts dissolve, and a vacated current turn advances so
    /// the room is never blocked on a ghost.
    pub fn handle_departure(&mut self, departing: &PlayerId, hand: &[Resource]) {
        self.bank.add_bundle(&ResourceBundle::tally(hand));
        self.pending_discards.remove(departing);

        if let Some(pos) = self.steal_candidates.iter().position(|p| p == departing) {
            self.steal_candidates.remove(pos);
            if self.steal_candidates.is_empty() && self.phase == Phase::PlayerStealingCard {
                self.phase = Phase::PlayerTurn;
            }
        }

        let Some(pos) = self.turn_order.iter().position(|p| p == departing) else {
            return;
        };
        let was_current = pos == self.turn_index;
        self.turn_order.remove(pos);
        if self.turn_order.is_empty() {
            self.turn_index = 0;
            return;
        }

        let n = self.turn_order.len();
        if pos < self.turn_index {
            self.turn_index -= 1;
        } else if self.turn_index >= n {
            self.turn_index = 0;
        }

        match self.phase {
            Phase::Setup => {
                if self.setup_turn >= 2 * n {
                    self.phase = Phase::RollingDice;
                    self.turn_index = 0;
                    self.dice = None;
                    self.setup_placed_settlement = false;
                    self.setup_placed_road = false;
                } else if was_current {
                    self.turn_index = snake_index(self.setup_turn, n);
                    self.setup_placed_settlement = false;
                    self.setup_placed_road = false;
                }
            }
            Phase::PlayerTurn | Phase::PlayerTurnKnight | Phase::PlayerStealingCard => {
                if was_current {
                    self.steal_candidates.clear();
                    self.phase = Phase::RollingDice;
                    self.dice = None;
                }
            }
            Phase::Lobby | Phase::RollingDice => {}
        }
    }
}

/// Turn index for the 1-based setup counter `c` with `n` players:
/// 0,1,..,n-1 then n-1,..,1,0.
fn snake_index(c: usize, n: usize) -> usize {
    if c <= n { c - 1 } else { 2 * n - c }
}

/// Move one uniformly random card from `from`'s hand to `to`'s. A no-op
/// when either player is gone or the hand is empty.
fn transfer_random_card(
    players: &mut [Player],
    from: &PlayerId,
    to: &PlayerId,
    rng: &mut impl Rng,
) {
    let Some(victim) = players.iter_mut().find(|p| &p.id == from) else {
        return;
    };
    let Some(card) = victim.take_random_card(rng) else {
        return;
    };
    if let Some(thief) = players.iter_mut().find(|p| &p.id == to) {
        thief.hand.push(card);
    }
}

/// Check the hand against `cost`, remove the cards, and return them to
/// the bank.
fn pay_cost(
    player: &mut Player,
    cost: &ResourceBundle,
    bank: &mut ResourceBundle,
) -> Result<(), GameError> {
    if !ResourceBundle::tally(&player.hand).covers(cost) {
        return Err(GameError::CannotAfford);
    }
    for (kind, amount) in cost.iter() {
        for _ in 0..amount {
            if let Some(idx) = player.hand.iter().position(|c| *c == kind) {
                player.hand.swap_remove(idx);
            }
        }
    }
    bank.add_bundle(cost);
    Ok(())
}
