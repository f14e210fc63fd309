use std::collections::HashMap;

use cucumber::World;
use log::*;
use settlement_engine::{
    db_types::{OrderId, PaymentReference},
    events::EventProducers,
    ReconciliationApi,
    SettlementApi,
    SettlementError,
    SettlementOutcome,
    SqliteDatabase,
};

use crate::support::{new_database, test_config, FakeGateway};

#[derive(Default, Debug, World)]
pub struct SettlementWorld {
    pub system: Option<SettlementSystem>,
}

pub type SettleResult = Result<SettlementOutcome, SettlementError>;

#[derive(Debug)]
pub struct SettlementSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub gateway: FakeGateway,
    pub settlement: SettlementApi<SqliteDatabase, FakeGateway>,
    pub reconciliation: ReconciliationApi<SqliteDatabase, FakeGateway>,
    /// Outcomes of the most recent settle call(s), in the order they were requested.
    pub results: Vec<(OrderId, SettleResult)>,
    pub references: HashMap<OrderId, PaymentReference>,
}

impl SettlementWorld {
    pub fn system(&self) -> &SettlementSystem {
        self.system.as_ref().expect("Settlement system not initialised")
    }

    pub fn system_mut(&mut self) -> &mut SettlementSystem {
        self.system.as_mut().expect("Settlement system not initialised")
    }
}

impl SettlementSystem {
    pub async fn new() -> Self {
        let db = new_database().await;
        let db_path = settlement_engine::SettlementDatabase::url(&db).to_string();
        debug!("Created database: {db_path}");
        let gateway = FakeGateway::default();
        let settlement = SettlementApi::new(db.clone(), gateway.clone(), test_config(), EventProducers::default());
        let reconciliation =
            ReconciliationApi::new(db.clone(), gateway.clone(), test_config(), EventProducers::default());
        Self {
            db_path,
            db,
            gateway,
            settlement,
            reconciliation,
            results: Vec::new(),
            references: HashMap::new(),
        }
    }

    pub fn record(&mut self, order_id: OrderId, result: SettleResult) {
        if let Ok(outcome) = &result {
            self.references.insert(order_id.clone(), outcome.payment.reference.clone());
        }
        if let Err(SettlementError::GatewayTimeout(reference)) = &result {
            self.references.insert(order_id.clone(), reference.clone());
        }
        self.results.push((order_id, result));
    }

    pub fn reference_for(&self, order_id: &OrderId) -> PaymentReference {
        self.references.get(order_id).cloned().expect("No payment has been made for this order")
    }
}
