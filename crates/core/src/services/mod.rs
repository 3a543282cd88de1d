pub mod dashboard_service;
pub mod intake_service;
pub mod ledger_service;
pub mod price_gateway;
