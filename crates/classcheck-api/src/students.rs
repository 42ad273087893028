// Student roster endpoints
//
// FastAPI mounts the collection at `/students/` (trailing slash) and single
// entries at `/students/{id}`.

use tracing::debug;

use crate::client::ClassCheckClient;
use crate::error::Error;
use crate::types::{StudentCreateRequest, StudentResponse, StudentUpdateRequest};

/// Largest page the service hands out for `/students/`.
pub const STUDENT_PAGE_SIZE: u32 = 100;

impl ClassCheckClient {
    /// List one page of the roster.
    ///
    /// `GET /students/?skip={skip}&limit={limit}`
    pub async fn list_students(&self, skip: u32, limit: u32) -> Result<Vec<StudentResponse>, Error> {
        debug!(skip, limit, "listing students");
        self.get_with_params(
            "students/",
            &[("skip", skip.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    /// Fetch the whole roster, following pages until a short page arrives.
    pub async fn list_all_students(&self) -> Result<Vec<StudentResponse>, Error> {
        let mut all = Vec::new();
        let mut skip = 0;
        loop {
            let page = self.list_students(skip, STUDENT_PAGE_SIZE).await?;
            let fetched = u32::try_from(page.len()).unwrap_or(u32::MAX);
            all.extend(page);
            if fetched < STUDENT_PAGE_SIZE {
                break;
            }
            skip += STUDENT_PAGE_SIZE;
        }
        Ok(all)
    }

    /// `GET /students/{id}`
    pub async fn get_student(&self, id: u64) -> Result<StudentResponse, Error> {
        self.get(&format!("students/{id}")).await
    }

    /// `POST /students/` -- 400 when the roll number is already registered.
    pub async fn create_student(
        &self,
        body: &StudentCreateRequest,
    ) -> Result<StudentResponse, Error> {
        debug!(roll_no = %body.roll_no, "creating student");
        self.post("students/", body).await
    }

    /// `PUT /students/{id}` -- partial update.
    pub async fn update_student(
        &self,
        id: u64,
        body: &StudentUpdateRequest,
    ) -> Result<StudentResponse, Error> {
        debug!(id, "updating student");
        self.put(&format!("students/{id}"), body).await
    }

    /// `DELETE /students/{id}` -- 204 on success.
    pub async fn delete_student(&self, id: u64) -> Result<(), Error> {
        debug!(id, "deleting student");
        self.delete(&format!("students/{id}")).await
    }
}
