use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db::traits::{SettlementManagement, SettlementUpdate},
    db_types::{Amount, Settlement},
    events::{NotificationHub, SettlementEvent},
    negotiation_objects::{AmountRevision, SettlementResponse},
    NegotiationError,
};

/// How many times a mutation is re-evaluated after losing a race with a concurrent write to the same settlement.
const MAX_WRITE_ATTEMPTS: usize = 5;

/// `NegotiationApi` is the primary API for negotiating settlements.
///
/// Every mutation is committed to the database before subscribers are notified, so notifications always reflect
/// durable state.
pub struct NegotiationApi<B> {
    db: B,
    hub: NotificationHub,
}

impl<B> Debug for NegotiationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NegotiationApi ({:?})", self.hub)
    }
}

impl<B> NegotiationApi<B> {
    pub fn new(db: B, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }
}

impl<B> NegotiationApi<B>
where B: SettlementManagement
{
    /// Opens a new negotiation with the given amount on the table.
    pub async fn propose(&self, amount: Amount) -> Result<Settlement, NegotiationError> {
        let settlement = self.db.insert_settlement(amount).await?;
        info!("🤝️ New settlement #{} proposed for {amount}", settlement.id);
        Ok(settlement)
    }

    /// Records the counterparty's response to the amount on the table and notifies the general channel.
    ///
    /// Fails with [`NegotiationError::NotFound`] if the settlement does not exist, and with
    /// [`NegotiationError::AlreadyAgreed`] if it has already been accepted.
    pub async fn respond(&self, id: i64, response: SettlementResponse) -> Result<Settlement, NegotiationError> {
        let settlement = self.write_with_retry(id, |current| response.apply_to(current, Utc::now())).await?;
        info!("🤝️ {settlement}: response recorded");
        let notified = self.hub.publish(&SettlementEvent::responded(&settlement)).await;
        debug!("🤝️ {notified} general subscribers notified of the response to settlement #{id}");
        Ok(settlement)
    }

    /// Replaces the amount on the table and notifies the settlement's own channel. The settlement goes back to
    /// `pending`.
    ///
    /// Besides the errors of [`Self::respond`], this fails with [`NegotiationError::StaleRevision`] if a response was
    /// recorded after `revision.last_seen`.
    pub async fn revise(&self, id: i64, revision: AmountRevision) -> Result<Settlement, NegotiationError> {
        let settlement = self.write_with_retry(id, |current| revision.apply_to(current)).await?;
        info!("🤝️ {settlement}: amount revised");
        let notified = self.hub.publish(&SettlementEvent::revised(&settlement)).await;
        debug!("🤝️ {notified} subscribers of settlement #{id} notified of the revision");
        Ok(settlement)
    }

    pub async fn settlement(&self, id: i64) -> Result<Settlement, NegotiationError> {
        self.db.fetch_settlement(id).await?.ok_or(NegotiationError::NotFound(id))
    }

    pub async fn settlements(&self) -> Result<Vec<Settlement>, NegotiationError> {
        Ok(self.db.fetch_settlements().await?)
    }

    /// Reads the settlement, applies `rule` to it and writes the result, provided nobody else wrote to the settlement
    /// in the meantime. Otherwise the rule is re-evaluated against the fresh state.
    async fn write_with_retry<F>(&self, id: i64, rule: F) -> Result<Settlement, NegotiationError>
    where F: Fn(&Settlement) -> Result<SettlementUpdate, NegotiationError> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let current = self.db.fetch_settlement(id).await?.ok_or(NegotiationError::NotFound(id))?;
            let update = rule(&current).map_err(|e| {
                debug!("🤝️ Settlement #{id} cannot be modified. {e}");
                e
            })?;
            match self.db.update_settlement(id, current.revision, update).await? {
                Some(updated) => return Ok(updated),
                None => debug!("🤝️ Settlement #{id} was modified concurrently (attempt {attempt}). Re-reading."),
            }
        }
        warn!("🤝️ Gave up modifying settlement #{id} after {MAX_WRITE_ATTEMPTS} attempts");
        Err(NegotiationError::Contention(id))
    }
}
