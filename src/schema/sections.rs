use super::field::{FieldDef, FieldGroup, Section};

const SEX: &[&str] = &["Male", "Female", "Other"];
const YES_NO: &[&str] = &["Yes", "No"];

pub static VISA_APPLICATION: Section = Section {
    key: "visaApplications",
    table: "visa_applications",
    title: "Visa Application",
    icon: "🛂",
    repeatable: false,
    fields: &[
        FieldDef::text("family_name", "Family Name"),
        FieldDef::text("given_name", "Given Name"),
        FieldDef::email("email", "Email", "Enter a valid email address"),
        FieldDef::date("date_of_birth", "Date of Birth"),
        FieldDef::text("birth_place", "Birth Place"),
        FieldDef::tel("mobile_no", "Mobile Number"),
        FieldDef::select("sex", "Sex", SEX),
        FieldDef::select(
            "relationship_status",
            "Relationship Status",
            &["Single", "Married", "Divorced", "Widowed", "De Facto", "Engaged", "Never Married", "Separated"],
        ),
        FieldDef::date("marriage_date", "Marriage Date"),
        FieldDef::text("native_language", "Native Language"),
        FieldDef::date("first_arrival_date_australia", "First Arrival Date (Australia)"),
        FieldDef::select("reason_for_name_change", "Reason for Name Change", &["", "Deed Poll", "Marriage", "Other"]),
        FieldDef::select("is_australian_study_required", "Australian Study Required", YES_NO),
        FieldDef::select("regional_australian_study", "Regional Australian Study", YES_NO),
        FieldDef::text("emergency_contact_name", "Emergency Contact Person Name"),
        FieldDef::email("emergency_contact_email", "Emergency Contact Person Email", "Enter a valid email"),
        FieldDef::tel("emergency_contact_mobile", "Emergency Contact Person Mobile No"),
        FieldDef::text("emergency_contact_relationship", "Relationship With Emergency Contact"),
        FieldDef::text("passport_no", "Passport No"),
        FieldDef::text("country_of_passport", "Country of Passport"),
        FieldDef::text("passport_holder_nationality", "Passport Holder Nationality"),
        FieldDef::date("passport_issue_date", "Passport Issue Date"),
        FieldDef::date("passport_expiry_date", "Passport Expiry Date"),
        FieldDef::text("passport_issue_place", "Passport Issue Place"),
    ],
    field_groups: &[
        FieldGroup {
            title: "Personal Details",
            fields: &[
                FieldDef::text("family_name", "Family Name"),
                FieldDef::text("given_name", "Given Name (As per Passport)"),
                FieldDef::email("email", "Email", "Enter a valid email address"),
                FieldDef::date("date_of_birth", "DOB"),
                FieldDef::text("birth_place", "Birth Place"),
                FieldDef::tel("mobile_no", "Mobile No"),
                FieldDef::select("sex", "Sex", SEX),
                FieldDef::select(
                    "relationship_status",
                    "Relationship Status",
                    &["Single", "Married", "Divorced", "Widowed", "De Facto", "Engaged", "Never Married", "Separated"],
                ),
                FieldDef::date("marriage_date", "Marriage Date"),
                FieldDef::text("native_language", "Native Language"),
                FieldDef::date("first_arrival_date_australia", "First Arrival Date Australia (If Applicable)"),
            ],
        },
        FieldGroup {
            title: "Other Names/Spellings (If Applicable)",
            fields: &[FieldDef::select("reason_for_name_change", "Reason for Name Change", &["Deed Poll", "Marriage", "Other"])],
        },
        FieldGroup {
            title: "Australian Study (If Applicable)",
            fields: &[
                FieldDef::select("is_australian_study_required", "Is Australian Study Require (If Applicable)", YES_NO),
                FieldDef::select("regional_australian_study", "Regional Australian Study (If Applicable)", YES_NO),
            ],
        },
        FieldGroup {
            title: "Emergency Contact Details",
            fields: &[
                FieldDef::text("emergency_contact_name", "Emergency Contact Person Name"),
                FieldDef::email("emergency_contact_email", "Emergency Contact Person Email", "Enter a valid email"),
                FieldDef::tel("emergency_contact_mobile", "Emergency Contact Person Mobile No"),
                FieldDef::text("emergency_contact_relationship", "Relationship With Emergency Contact"),
            ],
        },
        FieldGroup {
            title: "Passport Details",
            fields: &[
                FieldDef::text("passport_no", "Passport No"),
                FieldDef::text("country_of_passport", "Country of Passport"),
                FieldDef::text("passport_holder_nationality", "Passport Holder Nationality"),
                FieldDef::date("passport_issue_date", "Passport Issue Date"),
                FieldDef::date("passport_expiry_date", "Passport Expiry Date"),
                FieldDef::text("passport_issue_place", "Passport Issue Place"),
            ],
        },
    ],
};

pub static STUDENT_DETAILS: Section = Section {
    key: "studentDetails",
    table: "student_details",
    title: "Student Details",
    icon: "🎓",
    repeatable: false,
    fields: &[
        FieldDef::text("student_id_no", "Student ID"),
        FieldDef::text("usi_number", "Unique Student Identifier (USI) Number"),
        FieldDef::text("university_college_name", "University/College Name"),
        FieldDef::text("course_name", "Course Name"),
        FieldDef::date("course_from", "Course From"),
        FieldDef::date("course_to", "Course To"),
    ],
    field_groups: &[],
};

pub static FAMILY_MEMBERS: Section = Section {
    key: "familyMembers",
    table: "family_members",
    title: "Family Details",
    icon: "👪",
    repeatable: true,
    fields: &[
        FieldDef::text("full_name", "Full Name (As per Passport)").required(),
        FieldDef::select("sex", "Sex", SEX).required(),
        FieldDef::date("dob", "DOB").required(),
        FieldDef::text("relationship", "Relationship with you").required(),
        FieldDef::select("relationship_status", "Relationship Status", &["Single", "Married", "Divorced", "Widowed", "De Facto"]),
        FieldDef::text("birth_city", "Birth City"),
        FieldDef::text("current_country", "Current Country"),
    ],
    field_groups: &[],
};

pub static RELATIVES_AUSTRALIA: Section = Section {
    key: "relativesAustralia",
    table: "relatives_australia",
    title: "Relatives in Australia",
    icon: "🇦🇺",
    repeatable: true,
    fields: &[
        FieldDef::text("full_name", "Full Name (As per Passport)").required(),
        FieldDef::text("relationship", "Relationship with you").required(),
        FieldDef::date("dob", "DOB"),
        FieldDef::text("birth_city", "Birth City"),
        FieldDef::text("nationality", "Nationality"),
        FieldDef::text("address", "Address"),
        FieldDef::tel("contact_no", "Contact No."),
        FieldDef::email("email", "Email", "Enter a valid email"),
    ],
    field_groups: &[],
};

pub static TRAVEL_HISTORY: Section = Section {
    key: "travelHistory",
    table: "travel_history",
    title: "Travel History",
    icon: "✈️",
    repeatable: true,
    fields: &[
        FieldDef::text("country", "Country").required(),
        FieldDef::date("from_date", "From Date").required(),
        FieldDef::date("to_date", "To Date").required(),
        FieldDef::select(
            "reason_for_visit",
            "Reason for Visit",
            &["Work, Study or Training", "Business", "Visit Family", "Holiday or Leisure", "Military Deployment", "Other"],
        )
        .required(),
    ],
    field_groups: &[],
};

pub static RESIDENT_HISTORY: Section = Section {
    key: "residentHistory",
    table: "resident_history",
    title: "Resident History",
    icon: "🏠",
    repeatable: true,
    fields: &[
        FieldDef::text("address", "Address").required(),
        FieldDef::text("country", "Country").required(),
        FieldDef::date("address_from", "Address From").required(),
        FieldDef::date("address_to", "Address To (leave blank if current)"),
    ],
    field_groups: &[],
};

pub static IDENTIFICATION_DOCUMENTS: Section = Section {
    key: "identificationDocuments",
    table: "identification_documents",
    title: "National Identification Documents",
    icon: "🪪",
    repeatable: true,
    fields: &[
        FieldDef::select(
            "document_type",
            "Document Type",
            &["Aadhar Card", "Birth Certificate", "Marriage Certificate", "Driving Licence"],
        )
        .required(),
        FieldDef::text("name_as_per_document", "Name as Per Document").required(),
        FieldDef::text("identification_no", "Identification No").required(),
        FieldDef::text("issue_country", "Issue Country").required(),
    ],
    field_groups: &[],
};

pub static EDUCATION_QUALIFICATIONS: Section = Section {
    key: "educationQualifications",
    table: "education_qualifications",
    title: "Education Qualifications",
    icon: "📚",
    repeatable: true,
    fields: &[
        FieldDef::select(
            "qualification",
            "Qualification",
            &[
                "Doctoral Degree in Science, Business or Technology",
                "Doctoral Degree (Other)",
                "Master Degree in Science, Business or Technology",
                "Master Degree (Other)",
                "Honours Degree in Science, Business or Technology",
                "Honours Degree (Other)",
                "Bachelor Degree in Science, Business or Technology",
                "Bachelor Degree (Other)",
                "Graduate Diploma",
                "Advance Diploma",
                "Associate Degree",
                "Diploma",
                "AQF Certificate IV",
                "AQF Certificate III",
                "Certificate III (Non-AQF)",
                "Senior Secondary School Certificate",
                "Other - Non AQF Accreditation",
                "Other",
            ],
        )
        .required(),
        FieldDef::text("university_college_name", "University/College Name").required(),
        FieldDef::text("course_name", "Course Name").required(),
        FieldDef::date("from_date", "From Date").required(),
        FieldDef::date("to_date", "To Date"),
    ],
    field_groups: &[],
};

pub static EMPLOYMENT_HISTORY: Section = Section {
    key: "employmentHistory",
    table: "employment_history",
    title: "Employment History",
    icon: "💼",
    repeatable: true,
    fields: &[
        FieldDef::text("position", "Position").required(),
        FieldDef::text("duty", "Duty (Write only one)").required(),
        FieldDef::text("employer_name", "Employer (Company Name)").required(),
        FieldDef::text("employer_abn", "Employer ABN No (If Applicable)"),
        FieldDef::text("contact_person_name", "Contact Person Full Name"),
        FieldDef::tel("contact_no", "Contact No"),
        FieldDef::text("work_location", "Work Location (Address)").required(),
        FieldDef::text("country", "Country").required(),
        FieldDef::date("from_date", "From Date").required(),
        FieldDef::date("to_date", "To Date (blank if current)"),
    ],
    field_groups: &[],
};

pub static SPONSOR_DETAILS: Section = Section {
    key: "sponsorDetails",
    table: "sponsor_details",
    title: "Sponsor Details (If Applicable)",
    icon: "🤝",
    repeatable: true,
    fields: &[
        FieldDef::text("family_name", "Family Name").required(),
        FieldDef::text("given_name", "Given Name (As per Passport)").required(),
        FieldDef::email("email", "Email", "Enter a valid email"),
        FieldDef::tel("mobile_no", "Mobile No"),
        FieldDef::text("address", "Address"),
        FieldDef::select(
            "australian_residency_status",
            "Australian Residency Status",
            &[
                "Australian Citizen",
                "Australian Permanent Resident",
                "Australian Temporary Resident (Student)",
                "Australian Temporary Resident (Visitor)",
                "Australian Temporary Resident (Work Visa)",
                "Other",
                "Unknown",
            ],
        ),
        FieldDef::select(
            "relationship_to_applicant",
            "Relationship to the Applicant",
            &[
                "Aunt",
                "Brother",
                "Business Associate",
                "Child",
                "Cousin",
                "Daughter",
                "Daughter/Son-in-Law",
                "Fiance/Fiancee",
                "Grand Child",
                "Grand Parent",
                "Mother/Father-in-Law",
                "Nephew",
                "Niece",
                "Other",
                "Parent",
                "Sister",
                "Sister/Brother-in-Law",
                "Son",
            ],
        ),
    ],
    field_groups: &[],
};

pub static TEST_CERTIFICATIONS: Section = Section {
    key: "testCertifications",
    table: "test_certifications",
    title: "Test & Certifications",
    icon: "📝",
    repeatable: true,
    fields: &[
        FieldDef::select("category", "Category", &["English Test", "NAATI", "Professional Year"]).required(),
        FieldDef::select("english_test_name", "Test Name", &["CAE", "PTE", "TOEFL", "IELTS", "OET"]),
        FieldDef::text("english_test_country", "Test Country"),
        FieldDef::text("english_test_reference_no", "Test Reference No"),
        FieldDef::date("english_test_date", "Test Date"),
        FieldDef::date("english_expiry_date", "Test Expiry Date"),
        FieldDef::number("listening_score", "Listening Band Score"),
        FieldDef::number("reading_score", "Reading Band Score"),
        FieldDef::number("writing_score", "Writing Band Score"),
        FieldDef::number("speaking_score", "Speaking Band Score"),
        FieldDef::number("overall_score", "Overall Band Score"),
        FieldDef::text("naati_test_type", "NAATI Test Type"),
        FieldDef::text("naati_test_reference_no", "NAATI Reference No."),
        FieldDef::date("naati_test_date", "NAATI Test Date"),
        FieldDef::date("naati_expiry_date", "NAATI Expiry Date"),
        FieldDef::select("py_name", "PY", &["Engineering", "Accountant", "IT"]),
        FieldDef::date("py_completion_date", "PY Completion Date"),
        FieldDef::date("py_expiry_date", "PY Expiry Date"),
    ],
    field_groups: &[],
};

pub static AUSTRALIAN_VISA_HISTORY: Section = Section {
    key: "australianVisaHistory",
    table: "australian_visa_history",
    title: "Australian Visa History (If Applicable)",
    icon: "📄",
    repeatable: true,
    fields: &[
        FieldDef::text("visa_subclass", "Visa SC").required(),
        FieldDef::text("trn_no", "TRN No"),
        FieldDef::text("visa_grant_number", "Visa Grant Number"),
        FieldDef::date("visa_grant_or_refusal_date", "Visa Grant/Refusal Date").required(),
        FieldDef::date("visa_expiry_date", "Visa Expiry Date"),
        FieldDef::select("status", "Status", &["Grant", "Pending", "Withdraw", "Refusal"]).required(),
    ],
    field_groups: &[],
};

pub static OTHER_COUNTRY_VISA_HISTORY: Section = Section {
    key: "otherCountryVisaHistory",
    table: "other_country_visa_history",
    title: "Other Country Visa History (If Applicable)",
    icon: "🌍",
    repeatable: true,
    fields: &[
        FieldDef::text("country", "Country").required(),
        FieldDef::text("visa_type", "Visa Type").required(),
        FieldDef::date("visa_grant_or_refusal_date", "Visa Grant/Refusal Date").required(),
        FieldDef::date("visa_expiry_date", "Visa Expiry Date"),
    ],
    field_groups: &[],
};

pub static VISA_REFUSAL_HISTORY: Section = Section {
    key: "visaRefusalHistory",
    table: "visa_refusal_history",
    title: "Refusal Visa History (Last 10 Years)",
    icon: "❌",
    repeatable: true,
    fields: &[
        FieldDef::text("country", "Country").required(),
        FieldDef::select("visa_type", "Visa Type", &["GSM Visa", "Student Visa", "Visitor Visa", "TR Visa", "ES Visa"]).required(),
        FieldDef::date("refusal_date", "Refusal Date").required(),
    ],
    field_groups: &[],
};

pub static HEALTH_INSURANCE: Section = Section {
    key: "healthInsurance",
    table: "health_insurance",
    title: "Health Insurance",
    icon: "🏥",
    repeatable: true,
    fields: &[
        FieldDef::select("insurance_type", "Insurance Type", &["OSHC", "OVHC"]).required(),
        FieldDef::text("insurer_name", "Name of Health Insurer").required(),
        FieldDef::text("policy_number", "Policy Number").required(),
        FieldDef::date("from_date", "From Date").required(),
        FieldDef::date("to_date", "To Date"),
    ],
    field_groups: &[],
};

pub static COE_HISTORY: Section = Section {
    key: "coeHistory",
    table: "coe_history",
    title: "Australian CoE History",
    icon: "🏛️",
    repeatable: true,
    fields: &[
        FieldDef::text("coe_code", "CoE Code").required(),
        FieldDef::text("cricos_code", "CRICOS Code").required(),
        FieldDef::text("university_name", "University/College Name").required(),
        FieldDef::text("course_name", "Course Name").required(),
        FieldDef::text("state", "State").required(),
        FieldDef::date("from_date", "From Date").required(),
        FieldDef::date("to_date", "To Date"),
        FieldDef::select("status", "Status", &["Enroll", "Completed", "Future", "Withdraw", "Cancel", "Differ Intake"]).required(),
        FieldDef::text("coe_document_url", "COE Document URL"),
    ],
    field_groups: &[],
};

pub static SKILL_ASSESSMENT: Section = Section {
    key: "skillAssessment",
    table: "skill_assessment",
    title: "Skill Assessment",
    icon: "🎯",
    repeatable: true,
    fields: &[
        FieldDef::text("occupation_name", "Occupation Name").required(),
        FieldDef::text("anzsco_code", "ANZSCO Code").required(),
        FieldDef::text("assessing_authority", "Assessing Authority").required(),
        FieldDef::text("reference_number", "Ref/Receipt"),
        FieldDef::date("assessment_date", "Skill Ass. Date").required(),
        FieldDef::date("expiry_date", "Skill Ass. Expiry"),
    ],
    field_groups: &[],
};
