pub use std::{collections::HashMap, sync::Arc, time::Duration};

pub use chrono::{NaiveDateTime as DateTime, TimeDelta, Utc};
pub use sea_orm::{
  ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, Database,
  DatabaseConnection, EntityTrait, NotSet, QueryFilter, QueryOrder, Set,
  TransactionTrait, sea_query::Expr,
};
pub use tracing::{debug, error, info, trace, warn};

pub use crate::error::{Error, Result};
