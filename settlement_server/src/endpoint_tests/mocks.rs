use mockall::mock;
use settlement_engine::{
    db_types::{Amount, Settlement},
    SettlementManagement,
    SettlementStoreError,
    SettlementUpdate,
};

mock! {
    pub SettlementStore {}
    impl SettlementManagement for SettlementStore {
        async fn insert_settlement(&self, amount: Amount) -> Result<Settlement, SettlementStoreError>;
        async fn fetch_settlement(&self, id: i64) -> Result<Option<Settlement>, SettlementStoreError>;
        async fn fetch_settlements(&self) -> Result<Vec<Settlement>, SettlementStoreError>;
        async fn update_settlement(
            &self,
            id: i64,
            expected_revision: i64,
            update: SettlementUpdate,
        ) -> Result<Option<Settlement>, SettlementStoreError>;
    }
}
