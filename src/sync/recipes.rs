use crate::common::{NewRecipe, Recipe, RecipeCategory, ServerErrorResponse, UserId};
use crate::error::ApiError;
use crate::network::ApiClient;
use crate::state::ToastQueue;

use super::paged::PagedList;
use super::{like_verb, report_failure, toggle_like};

#[derive(serde::Serialize)]
struct NewCategory<'a> {
    name: &'a str,
}

/// A user's recipes plus the shared category list.
pub struct RecipeStore {
    api: ApiClient,
    toasts: ToastQueue,
    user_id: UserId,
    recipes: PagedList<Recipe>,
    categories: Vec<RecipeCategory>,
    is_submitting: bool,
    is_loading_categories: bool,
    error: Option<ServerErrorResponse>,
}

impl RecipeStore {
    pub fn new(api: ApiClient, toasts: ToastQueue, user_id: UserId) -> Self {
        Self {
            api,
            toasts,
            user_id,
            recipes: PagedList::new(),
            categories: Vec::new(),
            is_submitting: false,
            is_loading_categories: false,
            error: None,
        }
    }

    pub fn recipes(&self) -> &PagedList<Recipe> {
        &self.recipes
    }

    pub fn categories(&self) -> &[RecipeCategory] {
        &self.categories
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_loading_categories(&self) -> bool {
        self.is_loading_categories
    }

    pub fn error(&self) -> Option<&ServerErrorResponse> {
        self.error.as_ref()
    }

    pub async fn load_categories(&mut self) -> Result<(), ApiError> {
        self.is_loading_categories = true;
        let result = self.api.get::<Vec<RecipeCategory>>("recipes/categories").await;
        self.is_loading_categories = false;

        match result {
            Ok(categories) => {
                self.categories = categories;
                Ok(())
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "fetching categories",
                    &err,
                    "Something went wrong, please try again later",
                );
                Err(err)
            }
        }
    }

    pub async fn create_category(&mut self, name: &str) -> Result<RecipeCategory, ApiError> {
        self.is_submitting = true;
        let result = self
            .api
            .post::<_, RecipeCategory>("recipes/categories", &NewCategory { name })
            .await;
        self.is_submitting = false;

        match result {
            Ok(category) => {
                self.categories.push(category.clone());
                self.toasts.success("New Category Created, good job!");
                Ok(category)
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "creating category",
                    &err,
                    "Could not create the category, please try again",
                );
                Err(err)
            }
        }
    }

    /// New recipes go to the head of the list.
    pub async fn create_recipe(&mut self, recipe: &NewRecipe) -> Result<Recipe, ApiError> {
        self.is_submitting = true;
        let result = self.api.post::<_, Recipe>("recipes", recipe).await;
        self.is_submitting = false;

        match result {
            Ok(created) => {
                self.recipes.prepend(created.clone());
                self.error = None;
                self.toasts.success("New Recipe Created, good job!");
                Ok(created)
            }
            Err(err) => {
                self.error = report_failure(
                    &self.toasts,
                    "creating recipe",
                    &err,
                    "Could not create the recipe, please try again",
                );
                Err(err)
            }
        }
    }

    pub async fn load_recipes(&mut self, page: u32) -> Result<bool, ApiError> {
        if !self.recipes.begin_load(page) {
            return Ok(false);
        }
        let path = format!("recipes/user/{}", self.user_id);
        match self.api.get_page::<Recipe>(&path, page).await {
            Ok(fetched) => {
                self.recipes.apply_page(page, fetched);
                Ok(true)
            }
            Err(err) => {
                self.recipes.fail_load();
                self.error = report_failure(
                    &self.toasts,
                    "fetching recipes",
                    &err,
                    "Something went wrong, please try again later",
                );
                Err(err)
            }
        }
    }

    pub async fn load_next(&mut self) -> Result<bool, ApiError> {
        let page = self.recipes.next_page();
        self.load_recipes(page).await
    }

    pub async fn toggle_like(&mut self, recipe_id: i64, is_liked: bool) -> Result<Recipe, ApiError> {
        match toggle_like::<Recipe>(&self.api, "recipes", recipe_id, is_liked).await {
            Ok(updated) => {
                self.recipes.replace(updated.clone());
                self.toasts
                    .success(format!("Recipe {} successfully!", like_verb(is_liked)));
                Ok(updated)
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "toggling like",
                    &err,
                    "Failed to update like status. Please try again.",
                );
                Err(err)
            }
        }
    }

    pub async fn delete_recipe(&mut self, recipe_id: i64) -> Result<(), ApiError> {
        match self.api.delete_empty(&format!("recipes/{recipe_id}")).await {
            Ok(()) => {
                self.recipes.remove(&recipe_id);
                self.toasts.success("Recipe deleted successfully!");
                Ok(())
            }
            Err(err) => {
                report_failure(
                    &self.toasts,
                    "deleting recipe",
                    &err,
                    "Failed to delete recipe. Please try again.",
                );
                Err(err)
            }
        }
    }
}
