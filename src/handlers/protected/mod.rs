// Endpoints behind `require_principal`. Every handler receives the resolved
// Principal and the request deadline; authorization happens in the services.
pub mod appointments;
pub mod auth;
pub mod cars;
pub mod clients;
pub mod employees;
pub mod repairs;
pub mod users;

use serde::Deserialize;
use uuid::Uuid;

use crate::services::ListQuery;

/// Query string accepted by every list endpoint. The owner filter may be
/// spelled after the entity's own owner field.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub owner_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub car_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        ListQuery {
            owner_id: params.owner_id.or(params.customer_id).or(params.user_id),
            car_id: params.car_id,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_aliases_collapse() {
        let customer = Uuid::new_v4();
        let query = ListQuery::from(ListParams { customer_id: Some(customer), limit: Some(5), ..Default::default() });
        assert_eq!(query.owner_id, Some(customer));
        assert_eq!(query.limit, Some(5));
    }
}
