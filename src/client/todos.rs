use serde::Deserialize;

use super::{ApiClient, ClientError};
use crate::models::{Todo, TodoInput};

#[derive(Debug, Deserialize)]
struct TodoList {
    todos: Vec<Todo>,
}

#[derive(Debug, Deserialize)]
struct TodoEnvelope {
    todo: Todo,
}

/// Client-side list of the signed-in user's todos.
///
/// Each action clears `error` before it starts and records the failure message
/// there when it fails; the error is also returned to the caller.
pub struct TodoStore {
    client: ApiClient,
    todos: Vec<Todo>,
    loading: bool,
    error: Option<String>,
}

impl TodoStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            todos: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Swaps the client, e.g. after the session changes. The cached list is dropped.
    pub fn set_client(&mut self, client: ApiClient) {
        self.client = client;
        self.todos.clear();
        self.error = None;
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn finish<T>(&mut self, result: Result<T, ClientError>, fallback: &str) -> Result<T, ClientError> {
        self.loading = false;
        result.map_err(|e| {
            self.error = Some(e.message_or(fallback));
            e
        })
    }

    /// Replaces the list with the server's, newest first.
    pub async fn fetch(&mut self) -> Result<(), ClientError> {
        self.begin();
        let result = self.client.get::<TodoList>("/todos").await;
        self.todos = self.finish(result, "Failed to fetch todos")?.todos;
        Ok(())
    }

    pub async fn add(&mut self, title: &str, description: Option<&str>) -> Result<Todo, ClientError> {
        self.begin();
        let input = TodoInput {
            title: title.to_string(),
            description: description.map(str::to_string),
        };
        let result = self.client.post::<_, TodoEnvelope>("/todos", &input).await;
        let todo = self.finish(result, "Failed to add todo")?.todo;
        self.todos.insert(0, todo.clone());
        Ok(todo)
    }

    pub async fn update(
        &mut self,
        id: i32,
        title: &str,
        description: Option<&str>,
    ) -> Result<Todo, ClientError> {
        self.begin();
        let input = TodoInput {
            title: title.to_string(),
            description: description.map(str::to_string),
        };
        let result = self
            .client
            .put::<_, TodoEnvelope>(&format!("/todos/{}", id), &input)
            .await;
        let todo = self.finish(result, "Failed to update todo")?.todo;
        self.replace(todo.clone());
        Ok(todo)
    }

    pub async fn delete(&mut self, id: i32) -> Result<(), ClientError> {
        self.begin();
        let result = self
            .client
            .delete::<serde_json::Value>(&format!("/todos/{}", id))
            .await;
        self.finish(result, "Failed to delete todo")?;
        self.todos.retain(|t| t.id != id);
        Ok(())
    }

    pub async fn toggle(&mut self, id: i32) -> Result<Todo, ClientError> {
        self.begin();
        let result = self
            .client
            .patch::<TodoEnvelope>(&format!("/todos/{}/toggle", id))
            .await;
        let todo = self.finish(result, "Failed to toggle todo")?.todo;
        self.replace(todo.clone());
        Ok(todo)
    }

    fn replace(&mut self, todo: Todo) {
        if let Some(slot) = self.todos.iter_mut().find(|t| t.id == todo.id) {
            *slot = todo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_new_store_is_idle() {
        let store = TodoStore::new(ApiClient::new("http://127.0.0.1:9/api"));
        assert!(store.todos().is_empty());
        assert!(!store.loading());
        assert!(store.error().is_none());
    }

    #[test]
    fn test_finish_records_fallback_and_clears_loading() {
        let mut store = TodoStore::new(ApiClient::new("http://127.0.0.1:9/api"));
        store.begin();
        assert!(store.loading());

        let result: Result<(), ClientError> = store.finish(
            Err(ClientError::Api {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: None,
            }),
            "Failed to fetch todos",
        );
        assert!(result.is_err());
        assert!(!store.loading());
        assert_eq!(store.error(), Some("Failed to fetch todos"));

        store.begin();
        assert!(store.error().is_none());
    }
}
