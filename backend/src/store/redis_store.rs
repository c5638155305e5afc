//! Redis-backed document store.
//!
//! Layout: `task:<id>` holds the JSON document, `tasks:owner:<owner>` is the
//! set of that owner's task ids. Writes that must check ownership run as
//! Lua scripts so the check and the write happen as one atomic step.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError, Script};
use shared::{Task, TaskChanges};
use uuid::Uuid;

use super::{
    prepare_changes, prepare_new, sort_by_creation, NewTask, StoreError, TaskFilter, TaskStore,
};

const INSERT_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end
redis.call('SET', KEYS[1], ARGV[1])
redis.call('SADD', KEYS[2], ARGV[2])
return 1
"#;

const UPDATE_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return false
end
local doc = cjson.decode(raw)
if doc.owner ~= ARGV[1] then
  return false
end
for field, value in pairs(cjson.decode(ARGV[2])) do
  doc[field] = value
end
doc.updatedAt = ARGV[3]
local encoded = cjson.encode(doc)
redis.call('SET', KEYS[1], encoded)
return encoded
"#;

const DELETE_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return false
end
local doc = cjson.decode(raw)
if doc.owner ~= ARGV[1] then
  return false
end
redis.call('DEL', KEYS[1])
redis.call('SREM', KEYS[2], doc.id)
return raw
"#;

impl From<RedisError> for StoreError {
    fn from(error: RedisError) -> Self {
        StoreError::Backend(error.to_string())
    }
}

fn task_key(id: Uuid) -> String {
    format!("task:{id}")
}

fn owner_key(owner: &str) -> String {
    format!("tasks:owner:{owner}")
}

fn decode(key: &str, raw: &str) -> Result<Task, StoreError> {
    serde_json::from_str(raw).map_err(|error| StoreError::Corrupt {
        key: key.to_string(),
        reason: error.to_string(),
    })
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|error| StoreError::Backend(error.to_string()))
}

/// Holds one auto-reconnecting connection for the life of the process.
#[derive(Clone)]
pub struct RedisTaskStore {
    connection: ConnectionManager,
    insert: Script,
    update: Script,
    delete: Script,
}

impl RedisTaskStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        let mut connection = ConnectionManager::new(client).await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut connection)
            .await?;
        Ok(Self {
            connection,
            insert: Script::new(INSERT_SCRIPT),
            update: Script::new(UPDATE_SCRIPT),
            delete: Script::new(DELETE_SCRIPT),
        })
    }
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    async fn create(&self, task: NewTask) -> Result<Task, StoreError> {
        let task = prepare_new(task, Utc::now())?;
        let mut connection = self.connection.clone();

        let inserted: i32 = self
            .insert
            .key(task_key(task.id))
            .key(owner_key(&task.owner))
            .arg(encode(&task)?)
            .arg(task.id.to_string())
            .invoke_async(&mut connection)
            .await?;
        if inserted == 0 {
            return Err(StoreError::Duplicate {
                field: "id".to_string(),
            });
        }
        Ok(task)
    }

    async fn find(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let mut connection = self.connection.clone();
        let ids: Vec<String> = connection.smembers(owner_key(&filter.owner)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| format!("task:{id}")).collect();
        let documents: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut connection)
            .await?;

        let mut tasks = Vec::with_capacity(documents.len());
        for (key, raw) in keys.iter().zip(documents) {
            // The id set can briefly outlive a document deleted elsewhere.
            let Some(raw) = raw else { continue };
            let task = decode(key, &raw)?;
            if filter.matches(&task) {
                tasks.push(task);
            }
        }
        // Set members come back in no particular order.
        sort_by_creation(&mut tasks);
        Ok(tasks)
    }

    async fn find_one(&self, id: Uuid, owner: &str) -> Result<Option<Task>, StoreError> {
        let key = task_key(id);
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.get(&key).await?;
        match raw {
            Some(raw) => Ok(Some(decode(&key, &raw)?).filter(|task| task.owner == owner)),
            None => Ok(None),
        }
    }

    async fn find_one_and_update(
        &self,
        id: Uuid,
        owner: &str,
        changes: &TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        let changes = prepare_changes(changes)?;
        let key = task_key(id);
        let mut connection = self.connection.clone();

        let updated: Option<String> = self
            .update
            .key(&key)
            .arg(owner)
            .arg(encode(&changes)?)
            .arg(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
            .invoke_async(&mut connection)
            .await?;
        updated.map(|raw| decode(&key, &raw)).transpose()
    }

    async fn find_one_and_delete(&self, id: Uuid, owner: &str) -> Result<Option<Task>, StoreError> {
        let key = task_key(id);
        let mut connection = self.connection.clone();

        let removed: Option<String> = self
            .delete
            .key(&key)
            .key(owner_key(owner))
            .arg(owner)
            .invoke_async(&mut connection)
            .await?;
        removed.map(|raw| decode(&key, &raw)).transpose()
    }
}
