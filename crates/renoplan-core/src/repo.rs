//! Typed repository interfaces, one per entity.

use crate::Result;
use renoplan_types::{
    AppRole, BillOfMaterials, BomItem, BomStatus, Conversation, Message, ProductMatch, Project,
    ProjectUpdate, ShoppingListEntry, Vendor, VendorInput,
};
use uuid::Uuid;

pub trait ConversationRepository: Send + Sync {
    fn create_conversation(&self, conversation: &Conversation) -> Result<()>;
    fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>>;
    /// Conversations owned by `user_id`, most recently updated first.
    fn list_conversations(&self, user_id: Option<Uuid>) -> Result<Vec<Conversation>>;
    fn rename_conversation(&self, id: Uuid, title: &str) -> Result<()>;
    /// Delete a conversation and its messages. Returns false if it did not exist.
    fn delete_conversation(&self, id: Uuid) -> Result<bool>;
}

pub trait MessageRepository: Send + Sync {
    /// Append a message and bump its conversation's `updated_at`.
    fn append_message(&self, message: &Message) -> Result<()>;
    /// Messages of a conversation in creation order.
    fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>>;
}

pub trait ProjectRepository: Send + Sync {
    fn create_project(&self, project: &Project) -> Result<()>;
    fn get_project(&self, id: Uuid) -> Result<Option<Project>>;
    fn list_projects(&self, user_id: Uuid) -> Result<Vec<Project>>;
    fn update_project(&self, id: Uuid, update: &ProjectUpdate) -> Result<Project>;
    /// Overwrite every stored field of an existing project.
    fn save_project(&self, project: &Project) -> Result<()>;
    fn delete_project(&self, id: Uuid) -> Result<bool>;
}

pub trait BomRepository: Send + Sync {
    /// Insert a BOM and all of its items atomically.
    fn create_bom(&self, bom: &BillOfMaterials, items: &[BomItem]) -> Result<()>;
    fn get_bom(&self, id: Uuid) -> Result<Option<BillOfMaterials>>;
    fn list_boms(&self, project_id: Uuid) -> Result<Vec<BillOfMaterials>>;
    fn list_bom_items(&self, bom_id: Uuid) -> Result<Vec<BomItem>>;
    fn get_bom_item(&self, id: Uuid) -> Result<Option<BomItem>>;
    fn set_bom_status(&self, id: Uuid, status: BomStatus) -> Result<()>;
}

pub trait ProductMatchRepository: Send + Sync {
    fn insert_product_matches(&self, matches: &[ProductMatch]) -> Result<()>;
    fn get_product_match(&self, id: Uuid) -> Result<Option<ProductMatch>>;
    fn list_product_matches(&self, bom_item_id: Uuid) -> Result<Vec<ProductMatch>>;
    fn set_product_selected(&self, id: Uuid, selected: bool) -> Result<ProductMatch>;
    /// Selected matches of a BOM's items.
    fn shopping_list(&self, bom_id: Uuid) -> Result<Vec<ShoppingListEntry>>;
}

pub trait VendorRepository: Send + Sync {
    /// Vendors ordered by priority, then name.
    fn list_vendors(&self, active_only: bool) -> Result<Vec<Vendor>>;
    fn create_vendor(&self, input: &VendorInput) -> Result<Vendor>;
    fn update_vendor(&self, id: Uuid, input: &VendorInput) -> Result<Vendor>;
    fn delete_vendor(&self, id: Uuid) -> Result<bool>;
}

pub trait UserRoleRepository: Send + Sync {
    fn has_role(&self, user_id: Uuid, role: AppRole) -> Result<bool>;
    fn grant_role(&self, user_id: Uuid, role: AppRole) -> Result<()>;
    fn revoke_role(&self, user_id: Uuid, role: AppRole) -> Result<bool>;
}
